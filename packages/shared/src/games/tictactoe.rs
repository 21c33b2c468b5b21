use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameRules, MoveError, Outcome, Seat, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn for_seat(seat: Seat) -> Mark {
        match seat {
            Seat::Player1 => Mark::X,
            Seat::Player2 => Mark::O,
        }
    }

    pub fn seat(self) -> Seat {
        match self {
            Mark::X => Seat::Player1,
            Mark::O => Seat::Player2,
        }
    }

    fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    pub board: [[Option<Mark>; 3]; 3],
    pub active: Mark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeMove {
    pub row: usize,
    pub col: usize,
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

pub struct TicTacToe;

impl GameRules for TicTacToe {
    type State = TicTacToeState;
    type Move = TicTacToeMove;

    fn initial_state<R: Rng + ?Sized>(_rng: &mut R) -> TicTacToeState {
        TicTacToeState {
            board: [[None; 3]; 3],
            active: Mark::X,
        }
    }

    fn apply_move(
        state: &TicTacToeState,
        mv: &TicTacToeMove,
        seat: Seat,
    ) -> Result<Transition<TicTacToeState>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if Mark::for_seat(seat) != state.active {
            return Err(MoveError::OutOfTurn);
        }
        if mv.row > 2 || mv.col > 2 {
            return Err(MoveError::rule("cell is outside the board"));
        }
        if state.board[mv.row][mv.col].is_some() {
            return Err(MoveError::rule("cell is already occupied"));
        }

        let mut next = state.clone();
        next.board[mv.row][mv.col] = Some(state.active);
        next.active = state.active.other();
        Ok(Transition::to(next, seat.other()))
    }

    fn terminal(state: &TicTacToeState) -> Option<Outcome> {
        if let Some(mark) = winner(&state.board) {
            return Some(Outcome::win(mark.seat()));
        }
        let full = state.board.iter().flatten().all(Option::is_some);
        full.then(Outcome::draw)
    }
}

fn winner(board: &[[Option<Mark>; 3]; 3]) -> Option<Mark> {
    LINES.iter().find_map(|line| {
        let [a, b, c] = line.map(|(r, c)| board[r][c]);
        match (a, b, c) {
            (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
            _ => None,
        }
    })
}

pub fn legal_moves(state: &TicTacToeState, seat: Seat) -> Vec<TicTacToeMove> {
    if Mark::for_seat(seat) != state.active {
        return Vec::new();
    }
    (0..3)
        .flat_map(|row| (0..3).map(move |col| TicTacToeMove { row, col }))
        .filter(|mv| state.board[mv.row][mv.col].is_none())
        .collect()
}
