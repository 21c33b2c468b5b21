use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::game_type::GameType;

/// The acting player has nothing to play and must take the named alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    MustDraw,
    MustPass,
}

impl Exhaustion {
    pub fn available_action(self) -> &'static str {
        match self {
            Exhaustion::MustDraw => "draw",
            Exhaustion::MustPass => "pass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The move breaks a rule of the game.
    Validation(String),
    /// No legal play exists; the caller should offer the alternative instead.
    Exhaustion(Exhaustion),
    OutOfTurn,
    GameOver,
    WrongGame { expected: GameType },
}

impl MoveError {
    pub fn rule(msg: impl Into<String>) -> Self {
        MoveError::Validation(msg.into())
    }
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MoveError::Validation(msg) => write!(f, "{}", msg),
            MoveError::Exhaustion(Exhaustion::MustDraw) => {
                write!(f, "no playable tile, you must draw")
            }
            MoveError::Exhaustion(Exhaustion::MustPass) => {
                write!(f, "no playable tile and the pool is empty, you must pass")
            }
            MoveError::OutOfTurn => write!(f, "not your turn"),
            MoveError::GameOver => write!(f, "game is already decided"),
            MoveError::WrongGame { expected } => {
                write!(f, "move does not belong to a {} game", expected)
            }
        }
    }
}

impl std::error::Error for MoveError {}
