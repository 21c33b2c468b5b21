//! Pure per-game rule engines.
//!
//! Every engine works on its own state shape and speaks in [`Seat`]s rather than
//! user ids; the room layer maps seats onto participants. Nothing here performs
//! I/O or touches shared state, so engines can be driven from tests directly.

pub mod bingo;
pub mod checkers;
pub mod chess;
pub mod connect4;
pub mod domino;
pub mod errors;
pub mod memory;
pub mod tictactoe;

use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::game_type::GameType;
pub use errors::{Exhaustion, MoveError};

use self::bingo::{Bingo, BingoMove, BingoState};
use self::checkers::{Checkers, CheckersMove, CheckersState};
use self::chess::{Chess, ChessMove, ChessState};
use self::connect4::{Connect4, Connect4Move, Connect4State};
use self::domino::{Domino, DominoMove, DominoState};
use self::memory::{Memory, MemoryMove, MemoryState};
use self::tictactoe::{TicTacToe, TicTacToeMove, TicTacToeState};

/// One of the two places at the table. Player one is always the room creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Seat::Player1 => 0,
            Seat::Player2 => 1,
        }
    }
}

/// Final result of a decided game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Option<Seat>,
    pub is_draw: bool,
}

impl Outcome {
    pub fn win(seat: Seat) -> Self {
        Outcome {
            winner: Some(seat),
            is_draw: false,
        }
    }

    pub fn draw() -> Self {
        Outcome {
            winner: None,
            is_draw: true,
        }
    }
}

/// A state change the scheduling layer must apply after a delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransition {
    pub delay_ms: u64,
    pub kind: PendingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingKind {
    /// Turn two mismatched memory cards back face-down.
    ConcealCards { indices: [usize; 2] },
}

/// Result of applying an accepted move.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub state: S,
    /// Seat that owns the next move. Shared-seat games echo the acting seat.
    pub next: Seat,
    pub pending: Option<PendingTransition>,
}

impl<S> Transition<S> {
    pub fn to(state: S, next: Seat) -> Self {
        Transition {
            state,
            next,
            pending: None,
        }
    }

    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Transition<T> {
        Transition {
            state: f(self.state),
            next: self.next,
            pending: self.pending,
        }
    }
}

/// The contract every engine implements.
pub trait GameRules {
    type State: Clone + Serialize + DeserializeOwned;
    type Move;

    fn initial_state<R: Rng + ?Sized>(rng: &mut R) -> Self::State;

    fn apply_move(
        state: &Self::State,
        mv: &Self::Move,
        seat: Seat,
    ) -> Result<Transition<Self::State>, MoveError>;

    fn terminal(state: &Self::State) -> Option<Outcome>;
}

/// Tagged union over the seven state shapes, keyed by `game_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum GameState {
    TicTacToe(TicTacToeState),
    Connect4(Connect4State),
    Memory(MemoryState),
    Checkers(CheckersState),
    Chess(ChessState),
    Bingo(BingoState),
    Domino(DominoState),
}

/// A move for one of the seven games, tagged the same way as [`GameState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum GameMove {
    TicTacToe(TicTacToeMove),
    Connect4(Connect4Move),
    Memory(MemoryMove),
    Checkers(CheckersMove),
    Chess(ChessMove),
    Bingo(BingoMove),
    Domino(DominoMove),
}

impl GameState {
    pub fn initial<R: Rng + ?Sized>(game_type: GameType, rng: &mut R) -> Self {
        match game_type {
            GameType::TicTacToe => GameState::TicTacToe(TicTacToe::initial_state(rng)),
            GameType::Connect4 => GameState::Connect4(Connect4::initial_state(rng)),
            GameType::Memory => GameState::Memory(Memory::initial_state(rng)),
            GameType::Checkers => GameState::Checkers(Checkers::initial_state(rng)),
            GameType::Chess => GameState::Chess(Chess::initial_state(rng)),
            GameType::Bingo => GameState::Bingo(Bingo::initial_state(rng)),
            GameType::Domino => GameState::Domino(Domino::initial_state(rng)),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            GameState::TicTacToe(_) => GameType::TicTacToe,
            GameState::Connect4(_) => GameType::Connect4,
            GameState::Memory(_) => GameType::Memory,
            GameState::Checkers(_) => GameType::Checkers,
            GameState::Chess(_) => GameType::Chess,
            GameState::Bingo(_) => GameType::Bingo,
            GameState::Domino(_) => GameType::Domino,
        }
    }

    pub fn apply(&self, mv: &GameMove, seat: Seat) -> Result<Transition<GameState>, MoveError> {
        match (self, mv) {
            (GameState::TicTacToe(s), GameMove::TicTacToe(m)) => {
                Ok(TicTacToe::apply_move(s, m, seat)?.map(GameState::TicTacToe))
            }
            (GameState::Connect4(s), GameMove::Connect4(m)) => {
                Ok(Connect4::apply_move(s, m, seat)?.map(GameState::Connect4))
            }
            (GameState::Memory(s), GameMove::Memory(m)) => {
                Ok(Memory::apply_move(s, m, seat)?.map(GameState::Memory))
            }
            (GameState::Checkers(s), GameMove::Checkers(m)) => {
                Ok(Checkers::apply_move(s, m, seat)?.map(GameState::Checkers))
            }
            (GameState::Chess(s), GameMove::Chess(m)) => {
                Ok(Chess::apply_move(s, m, seat)?.map(GameState::Chess))
            }
            (GameState::Bingo(s), GameMove::Bingo(m)) => {
                Ok(Bingo::apply_move(s, m, seat)?.map(GameState::Bingo))
            }
            (GameState::Domino(s), GameMove::Domino(m)) => {
                Ok(Domino::apply_move(s, m, seat)?.map(GameState::Domino))
            }
            _ => Err(MoveError::WrongGame {
                expected: self.game_type(),
            }),
        }
    }

    pub fn terminal(&self) -> Option<Outcome> {
        match self {
            GameState::TicTacToe(s) => TicTacToe::terminal(s),
            GameState::Connect4(s) => Connect4::terminal(s),
            GameState::Memory(s) => Memory::terminal(s),
            GameState::Checkers(s) => Checkers::terminal(s),
            GameState::Chess(s) => Chess::terminal(s),
            GameState::Bingo(s) => Bingo::terminal(s),
            GameState::Domino(s) => Domino::terminal(s),
        }
    }

    /// Seat expected to move next, or `None` for games without alternating turns.
    pub fn active_seat(&self) -> Option<Seat> {
        match self {
            GameState::TicTacToe(s) => Some(s.active.seat()),
            GameState::Connect4(s) => Some(s.active),
            GameState::Memory(s) => Some(s.active),
            GameState::Checkers(s) => Some(s.active),
            GameState::Chess(s) => Chess::side_to_move(s).ok(),
            GameState::Bingo(_) => None,
            GameState::Domino(s) => Some(s.active),
        }
    }

    /// Every move `seat` may submit right now. Empty when the game is decided.
    pub fn legal_moves(&self, seat: Seat) -> Vec<GameMove> {
        if self.terminal().is_some() {
            return Vec::new();
        }
        match self {
            GameState::TicTacToe(s) => tictactoe::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::TicTacToe)
                .collect(),
            GameState::Connect4(s) => connect4::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Connect4)
                .collect(),
            GameState::Memory(s) => memory::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Memory)
                .collect(),
            GameState::Checkers(s) => checkers::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Checkers)
                .collect(),
            GameState::Chess(s) => Chess::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Chess)
                .collect(),
            GameState::Bingo(s) => bingo::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Bingo)
                .collect(),
            GameState::Domino(s) => domino::legal_moves(s, seat)
                .into_iter()
                .map(GameMove::Domino)
                .collect(),
        }
    }

    /// Applies a delayed transition. Returns `None` when the state has moved on
    /// and the transition no longer applies.
    pub fn resolve_pending(&self, pending: &PendingTransition) -> Option<GameState> {
        match (self, &pending.kind) {
            (GameState::Memory(s), PendingKind::ConcealCards { indices }) => {
                memory::conceal(s, *indices).map(GameState::Memory)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_seat_other_is_involution() {
        assert_eq!(Seat::Player1.other(), Seat::Player2);
        assert_eq!(Seat::Player2.other().other(), Seat::Player2);
    }

    #[test]
    fn test_game_state_tag_matches_game_type() {
        let mut rng = StdRng::seed_from_u64(7);
        for game_type in GameType::ALL {
            let state = GameState::initial(game_type, &mut rng);
            assert_eq!(state.game_type(), game_type);

            let json = serde_json::to_value(&state).unwrap();
            assert_eq!(json["game_type"], serde_json::to_value(game_type).unwrap());

            let back: GameState = serde_json::from_value(json).unwrap();
            assert_eq!(back, state);
        }
    }

    #[test]
    fn test_mismatched_move_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = GameState::initial(GameType::Connect4, &mut rng);
        let mv = GameMove::TicTacToe(TicTacToeMove { row: 0, col: 0 });

        let result = state.apply(&mv, Seat::Player1);

        assert!(matches!(
            result,
            Err(MoveError::WrongGame {
                expected: GameType::Connect4
            })
        ));
    }

    #[test]
    fn test_initial_states_are_undecided() {
        let mut rng = StdRng::seed_from_u64(99);
        for game_type in GameType::ALL {
            let state = GameState::initial(game_type, &mut rng);
            assert!(state.terminal().is_none(), "{:?} starts decided", game_type);
        }
    }

    #[test]
    fn test_domino_move_wire_shape() {
        let json = r#"{"game_type":"domino","action":"play","tile":[3,5],"side":"left"}"#;
        let mv: GameMove = serde_json::from_str(json).unwrap();
        assert!(matches!(mv, GameMove::Domino(DominoMove::Play { .. })));

        let draw: GameMove = serde_json::from_str(r#"{"game_type":"domino","action":"draw"}"#).unwrap();
        assert_eq!(draw, GameMove::Domino(DominoMove::Draw));
    }
}
