use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    TicTacToe,
    Connect4,
    Memory,
    Checkers,
    Chess,
    Bingo,
    Domino,
}

impl GameType {
    pub const ALL: [GameType; 7] = [
        GameType::TicTacToe,
        GameType::Connect4,
        GameType::Memory,
        GameType::Checkers,
        GameType::Chess,
        GameType::Bingo,
        GameType::Domino,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::TicTacToe => "tictactoe",
            GameType::Connect4 => "connect4",
            GameType::Memory => "memory",
            GameType::Checkers => "checkers",
            GameType::Chess => "chess",
            GameType::Bingo => "bingo",
            GameType::Domino => "domino",
        }
    }

    /// Games where both players act independently instead of alternating.
    pub fn is_shared_seat(self) -> bool {
        matches!(self, GameType::Bingo)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown game type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(GameType::TicTacToe, "tictactoe")]
    #[test_case(GameType::Connect4, "connect4")]
    #[test_case(GameType::Domino, "domino")]
    fn test_wire_name(game_type: GameType, name: &str) {
        assert_eq!(serde_json::to_string(&game_type).unwrap(), format!("\"{}\"", name));
        assert_eq!(name.parse::<GameType>().unwrap(), game_type);
        assert_eq!(game_type.to_string(), name);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!("poker".parse::<GameType>().is_err());
    }
}
