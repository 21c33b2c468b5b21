mod engine;

use std::marker::PhantomData;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use engine::{ChessEngine, StandardChess};

use super::{GameRules, MoveError, Outcome, Seat, Transition};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessState {
    pub fen: String,
    /// Moves played so far, in standard algebraic notation.
    pub pgn: Vec<String>,
}

impl ChessState {
    /// Renders the move list as PGN movetext, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        self.pgn
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

/// Chess rules delegated entirely to a [`ChessEngine`].
pub struct ChessRules<E>(PhantomData<E>);

pub type Chess = ChessRules<StandardChess>;

impl<E: ChessEngine> ChessRules<E> {
    pub fn side_to_move(state: &ChessState) -> Result<Seat, MoveError> {
        Ok(E::load(&state.fen)?.turn())
    }

    /// Moves `seat` may play; empty when it is the other side's move.
    pub fn legal_moves(state: &ChessState, seat: Seat) -> Vec<ChessMove> {
        match E::load(&state.fen) {
            Ok(engine) if engine.turn() == seat => engine.legal_moves(),
            _ => Vec::new(),
        }
    }
}

impl<E: ChessEngine> GameRules for ChessRules<E> {
    type State = ChessState;
    type Move = ChessMove;

    fn initial_state<R: Rng + ?Sized>(_rng: &mut R) -> ChessState {
        ChessState {
            fen: START_FEN.to_string(),
            pgn: Vec::new(),
        }
    }

    fn apply_move(
        state: &ChessState,
        mv: &ChessMove,
        seat: Seat,
    ) -> Result<Transition<ChessState>, MoveError> {
        let mut engine = E::load(&state.fen)?;
        if engine.is_checkmate() || engine.is_draw() {
            return Err(MoveError::GameOver);
        }
        if engine.turn() != seat {
            return Err(MoveError::OutOfTurn);
        }

        let promotion = match mv.promotion.as_deref() {
            None => None,
            Some(p) => match p.chars().collect::<Vec<_>>().as_slice() {
                [c] => Some(*c),
                _ => return Err(MoveError::rule("invalid promotion piece")),
            },
        };
        let notation = engine.make_move(&mv.from, &mv.to, promotion)?;

        let mut pgn = state.pgn.clone();
        pgn.push(notation);
        let next = ChessState {
            fen: engine.fen(),
            pgn,
        };
        Ok(Transition::to(next, engine.turn()))
    }

    fn terminal(state: &ChessState) -> Option<Outcome> {
        let engine = E::load(&state.fen).ok()?;
        if engine.is_checkmate() {
            return Some(Outcome::win(engine.turn().other()));
        }
        engine.is_draw().then(Outcome::draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn mv(from: &str, to: &str) -> ChessMove {
        ChessMove {
            from: from.to_string(),
            to: to.to_string(),
            promotion: None,
        }
    }

    fn fresh() -> ChessState {
        Chess::initial_state(&mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_valid_move_updates_fen_and_history() {
        let t = Chess::apply_move(&fresh(), &mv("e2", "e4"), Seat::Player1).unwrap();

        assert_eq!(t.next, Seat::Player2);
        assert_eq!(t.state.pgn, vec!["e4"]);
        assert_ne!(t.state.fen, START_FEN);
        assert!(t.state.fen.contains(" b "));
    }

    #[test]
    fn test_wrong_side_is_out_of_turn() {
        let result = Chess::apply_move(&fresh(), &mv("e7", "e5"), Seat::Player2);
        assert_eq!(result.unwrap_err(), MoveError::OutOfTurn);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let result = Chess::apply_move(&fresh(), &mv("e2", "e5"), Seat::Player1);
        assert_eq!(result.unwrap_err(), MoveError::rule("illegal move"));
    }

    #[test]
    fn test_fools_mate_is_terminal_for_black() {
        let mut state = fresh();
        for (seat, from, to) in [
            (Seat::Player1, "f2", "f3"),
            (Seat::Player2, "e7", "e5"),
            (Seat::Player1, "g2", "g4"),
            (Seat::Player2, "d8", "h4"),
        ] {
            state = Chess::apply_move(&state, &mv(from, to), seat).unwrap().state;
        }

        assert_eq!(Chess::terminal(&state), Some(Outcome::win(Seat::Player2)));
        assert_eq!(state.movetext(), "1. f3 e5 2. g4 Qh4#");
        let after = Chess::apply_move(&state, &mv("a2", "a3"), Seat::Player1);
        assert_eq!(after.unwrap_err(), MoveError::GameOver);
    }

    #[test]
    fn test_legal_moves_only_for_side_to_move() {
        let state = fresh();
        assert_eq!(Chess::legal_moves(&state, Seat::Player1).len(), 20);
        assert!(Chess::legal_moves(&state, Seat::Player2).is_empty());
    }

    /// Engine that ignores the position: black to move, one reply available.
    struct ScriptedEngine;

    impl ChessEngine for ScriptedEngine {
        fn load(_fen: &str) -> Result<Self, MoveError> {
            Ok(ScriptedEngine)
        }
        fn fen(&self) -> String {
            START_FEN.to_string()
        }
        fn make_move(&mut self, _: &str, _: &str, _: Option<char>) -> Result<String, MoveError> {
            Err(MoveError::rule("illegal move"))
        }
        fn turn(&self) -> Seat {
            Seat::Player2
        }
        fn is_check(&self) -> bool {
            false
        }
        fn is_checkmate(&self) -> bool {
            false
        }
        fn is_stalemate(&self) -> bool {
            false
        }
        fn is_draw(&self) -> bool {
            false
        }
        fn legal_moves(&self) -> Vec<ChessMove> {
            vec![mv("a7", "a6")]
        }
    }

    #[test]
    fn test_legal_moves_come_from_the_plugged_engine() {
        let state = fresh();

        assert_eq!(
            ChessRules::<ScriptedEngine>::legal_moves(&state, Seat::Player2),
            vec![mv("a7", "a6")]
        );
        assert!(ChessRules::<ScriptedEngine>::legal_moves(&state, Seat::Player1).is_empty());
        assert_eq!(
            ChessRules::<ScriptedEngine>::side_to_move(&state),
            Ok(Seat::Player2)
        );
    }
}
