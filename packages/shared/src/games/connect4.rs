use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameRules, MoveError, Outcome, Seat, Transition};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Row 0 is the top of the board; pieces settle toward row `ROWS - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4State {
    pub board: [[Option<Seat>; COLS]; ROWS],
    pub active: Seat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4Move {
    pub column: usize,
}

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

pub struct Connect4;

impl GameRules for Connect4 {
    type State = Connect4State;
    type Move = Connect4Move;

    fn initial_state<R: Rng + ?Sized>(_rng: &mut R) -> Connect4State {
        Connect4State {
            board: [[None; COLS]; ROWS],
            active: Seat::Player1,
        }
    }

    fn apply_move(
        state: &Connect4State,
        mv: &Connect4Move,
        seat: Seat,
    ) -> Result<Transition<Connect4State>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if seat != state.active {
            return Err(MoveError::OutOfTurn);
        }
        if mv.column >= COLS {
            return Err(MoveError::rule("column is outside the board"));
        }
        let row = landing_row(state, mv.column).ok_or_else(|| MoveError::rule("column is full"))?;

        let mut next = state.clone();
        next.board[row][mv.column] = Some(seat);
        next.active = seat.other();
        Ok(Transition::to(next, seat.other()))
    }

    fn terminal(state: &Connect4State) -> Option<Outcome> {
        if let Some(seat) = winner(&state.board) {
            return Some(Outcome::win(seat));
        }
        state.board[0]
            .iter()
            .all(Option::is_some)
            .then(Outcome::draw)
    }
}

fn landing_row(state: &Connect4State, column: usize) -> Option<usize> {
    (0..ROWS).rev().find(|&row| state.board[row][column].is_none())
}

fn winner(board: &[[Option<Seat>; COLS]; ROWS]) -> Option<Seat> {
    for row in 0..ROWS {
        for col in 0..COLS {
            let Some(owner) = board[row][col] else {
                continue;
            };
            for (dr, dc) in DIRECTIONS {
                let run = (1..4).all(|step| {
                    let r = row as isize + dr * step;
                    let c = col as isize + dc * step;
                    r >= 0
                        && c >= 0
                        && (r as usize) < ROWS
                        && (c as usize) < COLS
                        && board[r as usize][c as usize] == Some(owner)
                });
                if run {
                    return Some(owner);
                }
            }
        }
    }
    None
}

pub fn legal_moves(state: &Connect4State, seat: Seat) -> Vec<Connect4Move> {
    if seat != state.active {
        return Vec::new();
    }
    (0..COLS)
        .filter(|&column| state.board[0][column].is_none())
        .map(|column| Connect4Move { column })
        .collect()
}
