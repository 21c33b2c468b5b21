//! Checkers on an 8x8 board with two ranks per side.
//!
//! Player one starts on the bottom two rows and moves toward row 0. Captures are
//! mandatory, and a capture move is the full chain of jumps found by depth-first
//! search from the moving piece. A player with pieces left but no legal move
//! loses.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameRules, MoveError, Outcome, Seat, Transition};

pub const SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Square {
    Empty,
    P1Man,
    P2Man,
    P1King,
    P2King,
}

impl Square {
    pub fn owner(self) -> Option<Seat> {
        match self {
            Square::Empty => None,
            Square::P1Man | Square::P1King => Some(Seat::Player1),
            Square::P2Man | Square::P2King => Some(Seat::Player2),
        }
    }

    pub fn is_king(self) -> bool {
        matches!(self, Square::P1King | Square::P2King)
    }

    fn king(seat: Seat) -> Square {
        match seat {
            Seat::Player1 => Square::P1King,
            Seat::Player2 => Square::P2King,
        }
    }

    fn directions(self) -> &'static [(isize, isize)] {
        const ALL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
        match self {
            Square::Empty => &[],
            Square::P1Man => &ALL[..2],
            Square::P2Man => &ALL[2..],
            Square::P1King | Square::P2King => &ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    fn on_board(self) -> bool {
        self.row < SIZE && self.col < SIZE
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < SIZE && col < SIZE).then_some(Coord { row, col })
    }
}

pub type Board = [[Square; SIZE]; SIZE];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersState {
    pub board: Board,
    pub active: Seat,
}

impl CheckersState {
    fn at(&self, c: Coord) -> Square {
        self.board[c.row][c.col]
    }
}

/// A submitted move. `path` disambiguates between chains that share both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersMove {
    pub from: Coord,
    pub to: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Coord>>,
}

/// A fully resolved candidate move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckersPlay {
    pub from: Coord,
    pub to: Coord,
    /// Landing squares in order, ending with `to`.
    pub path: Vec<Coord>,
    pub captures: Vec<Coord>,
}

impl From<CheckersPlay> for CheckersMove {
    fn from(play: CheckersPlay) -> Self {
        CheckersMove {
            from: play.from,
            to: play.to,
            path: (play.path.len() > 1).then_some(play.path),
        }
    }
}

pub struct Checkers;

impl GameRules for Checkers {
    type State = CheckersState;
    type Move = CheckersMove;

    fn initial_state<R: Rng + ?Sized>(_rng: &mut R) -> CheckersState {
        let mut board = [[Square::Empty; SIZE]; SIZE];
        for (row, cells) in board.iter_mut().enumerate() {
            let piece = match row {
                0 | 1 => Square::P2Man,
                6 | 7 => Square::P1Man,
                _ => continue,
            };
            for (col, cell) in cells.iter_mut().enumerate() {
                if is_dark(row, col) {
                    *cell = piece;
                }
            }
        }
        CheckersState {
            board,
            active: Seat::Player1,
        }
    }

    fn apply_move(
        state: &CheckersState,
        mv: &CheckersMove,
        seat: Seat,
    ) -> Result<Transition<CheckersState>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if seat != state.active {
            return Err(MoveError::OutOfTurn);
        }
        if !mv.from.on_board() || !mv.to.on_board() {
            return Err(MoveError::rule("square is outside the board"));
        }
        if state.at(mv.from).owner() != Some(seat) {
            return Err(MoveError::rule("no piece of yours on that square"));
        }

        let legal = legal_plays(state, seat);
        let must_capture = legal.iter().any(|p| !p.captures.is_empty());
        let chosen = legal
            .into_iter()
            .filter(|p| p.from == mv.from && p.to == mv.to)
            .filter(|p| mv.path.as_ref().map_or(true, |path| *path == p.path))
            .max_by_key(|p| p.captures.len());

        let Some(play) = chosen else {
            if must_capture && !is_capture_shape(mv) {
                return Err(MoveError::rule("must capture"));
            }
            return Err(MoveError::rule("illegal move"));
        };

        let mut next = state.clone();
        let piece = next.at(play.from);
        next.board[play.from.row][play.from.col] = Square::Empty;
        for c in &play.captures {
            next.board[c.row][c.col] = Square::Empty;
        }
        next.board[play.to.row][play.to.col] = if promotes(piece, play.to) {
            Square::king(seat)
        } else {
            piece
        };
        next.active = seat.other();
        Ok(Transition::to(next, seat.other()))
    }

    fn terminal(state: &CheckersState) -> Option<Outcome> {
        let mover = state.active;
        let has_pieces = state
            .board
            .iter()
            .flatten()
            .any(|sq| sq.owner() == Some(mover));
        // Stalemate counts as a loss for the side that cannot move.
        if !has_pieces || legal_plays(state, mover).is_empty() {
            return Some(Outcome::win(mover.other()));
        }
        None
    }
}

fn is_dark(row: usize, col: usize) -> bool {
    (row + col) % 2 == 1
}

fn is_capture_shape(mv: &CheckersMove) -> bool {
    mv.from.row.abs_diff(mv.to.row) >= 2 || mv.path.as_ref().is_some_and(|p| p.len() > 1)
}

fn promotes(piece: Square, to: Coord) -> bool {
    match piece {
        Square::P1Man => to.row == 0,
        Square::P2Man => to.row == SIZE - 1,
        _ => false,
    }
}

/// All legal plays for `seat`. When any capture exists only captures are returned.
pub fn legal_plays(state: &CheckersState, seat: Seat) -> Vec<CheckersPlay> {
    let own: Vec<Coord> = (0..SIZE)
        .flat_map(|row| (0..SIZE).map(move |col| Coord::new(row, col)))
        .filter(|&c| state.at(c).owner() == Some(seat))
        .collect();

    let captures: Vec<CheckersPlay> = own
        .iter()
        .flat_map(|&from| capture_chains(state, from))
        .collect();
    if !captures.is_empty() {
        return captures;
    }

    own.iter()
        .flat_map(|&from| {
            let piece = state.at(from);
            piece.directions().iter().filter_map(move |&(dr, dc)| {
                let to = from.offset(dr, dc)?;
                (state.at(to) == Square::Empty).then(|| CheckersPlay {
                    from,
                    to,
                    path: vec![to],
                    captures: Vec::new(),
                })
            })
        })
        .collect()
}

pub fn legal_moves(state: &CheckersState, seat: Seat) -> Vec<CheckersMove> {
    if seat != state.active {
        return Vec::new();
    }
    legal_plays(state, seat).into_iter().map(Into::into).collect()
}

/// Every maximal jump chain starting at `from`.
pub fn capture_chains(state: &CheckersState, from: Coord) -> Vec<CheckersPlay> {
    let piece = state.at(from);
    let Some(seat) = piece.owner() else {
        return Vec::new();
    };
    let mut search = ChainSearch {
        state,
        origin: from,
        piece,
        enemy: seat.other(),
        path: Vec::new(),
        captured: Vec::new(),
        found: Vec::new(),
    };
    search.walk(from);
    search.found
}

struct ChainSearch<'a> {
    state: &'a CheckersState,
    origin: Coord,
    piece: Square,
    enemy: Seat,
    path: Vec<Coord>,
    captured: Vec<Coord>,
    found: Vec<CheckersPlay>,
}

impl ChainSearch<'_> {
    fn walk(&mut self, at: Coord) {
        let mut extended = false;
        for &(dr, dc) in self.piece.directions() {
            let Some(over) = at.offset(dr, dc) else {
                continue;
            };
            let Some(land) = at.offset(2 * dr, 2 * dc) else {
                continue;
            };
            if self.captured.contains(&over) || self.state.at(over).owner() != Some(self.enemy) {
                continue;
            }
            // The moving piece has left its origin, so that square is free.
            if self.state.at(land) != Square::Empty && land != self.origin {
                continue;
            }

            extended = true;
            self.path.push(land);
            self.captured.push(over);
            if promotes(self.piece, land) {
                self.record(land);
            } else {
                self.walk(land);
            }
            self.path.pop();
            self.captured.pop();
        }

        if !extended && !self.captured.is_empty() {
            self.record(at);
        }
    }

    fn record(&mut self, to: Coord) {
        self.found.push(CheckersPlay {
            from: self.origin,
            to,
            path: self.path.clone(),
            captures: self.captured.clone(),
        });
    }
}
