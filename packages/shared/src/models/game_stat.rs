use serde::{Deserialize, Serialize};

use crate::models::game_type::GameType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    /// Name of the counter this result increments.
    pub fn counter(self) -> &'static str {
        match self {
            GameResult::Win => "wins",
            GameResult::Loss => "losses",
            GameResult::Draw => "draws",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStat {
    pub user_id: String,
    pub game_type: GameType,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl GameStat {
    pub fn new(user_id: &str, game_type: GameType) -> Self {
        GameStat {
            user_id: user_id.to_string(),
            game_type,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    pub fn record(&mut self, result: GameResult) {
        match result {
            GameResult::Win => self.wins += 1,
            GameResult::Loss => self.losses += 1,
            GameResult::Draw => self.draws += 1,
        }
    }

    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}
