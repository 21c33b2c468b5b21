use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use super::{GameRules, MoveError, Outcome, Seat, Transition};

pub const SIZE: usize = 5;
pub const MAX_NUMBER: u8 = 75;
/// Value stored in the centre cell of every card.
pub const FREE: u8 = 0;
const CENTER: usize = SIZE / 2;

pub type Card = [[u8; SIZE]; SIZE];
pub type Marks = [[bool; SIZE]; SIZE];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoState {
    /// Numbers in the order the caller drew them.
    pub called: Vec<u8>,
    pub cards: [Card; 2],
    pub marked: [Marks; 2],
}

impl BingoState {
    pub fn is_called(&self, number: u8) -> bool {
        self.called.contains(&number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoMove {
    pub row: usize,
    pub col: usize,
}

pub struct Bingo;

impl GameRules for Bingo {
    type State = BingoState;
    type Move = BingoMove;

    fn initial_state<R: Rng + ?Sized>(rng: &mut R) -> BingoState {
        let mut marks = [[false; SIZE]; SIZE];
        marks[CENTER][CENTER] = true;
        BingoState {
            called: Vec::new(),
            cards: [deal_card(rng), deal_card(rng)],
            marked: [marks, marks],
        }
    }

    fn apply_move(
        state: &BingoState,
        mv: &BingoMove,
        seat: Seat,
    ) -> Result<Transition<BingoState>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if mv.row >= SIZE || mv.col >= SIZE {
            return Err(MoveError::rule("cell is outside the card"));
        }
        let player = seat.index();
        if state.marked[player][mv.row][mv.col] {
            return Err(MoveError::rule("cell is already marked"));
        }
        if !state.is_called(state.cards[player][mv.row][mv.col]) {
            return Err(MoveError::rule("number not yet called"));
        }

        let mut next = state.clone();
        next.marked[player][mv.row][mv.col] = true;
        // Both players mark at will; there is no turn to hand over.
        Ok(Transition::to(next, seat))
    }

    fn terminal(state: &BingoState) -> Option<Outcome> {
        match (has_line(&state.marked[0]), has_line(&state.marked[1])) {
            (true, true) => Some(Outcome::draw()),
            (true, false) => Some(Outcome::win(Seat::Player1)),
            (false, true) => Some(Outcome::win(Seat::Player2)),
            (false, false) => None,
        }
    }
}

/// Column `c` draws five distinct numbers from `15c+1 ..= 15c+15`.
fn deal_card<R: Rng + ?Sized>(rng: &mut R) -> Card {
    let mut card = [[FREE; SIZE]; SIZE];
    for col in 0..SIZE {
        let low = col as u8 * 15 + 1;
        let mut range: Vec<u8> = (low..low + 15).collect();
        range.shuffle(rng);
        for row in 0..SIZE {
            card[row][col] = range[row];
        }
    }
    card[CENTER][CENTER] = FREE;
    card
}

fn has_line(marks: &Marks) -> bool {
    let rows = (0..SIZE).any(|r| (0..SIZE).all(|c| marks[r][c]));
    let cols = (0..SIZE).any(|c| (0..SIZE).all(|r| marks[r][c]));
    let diag = (0..SIZE).all(|i| marks[i][i]);
    let anti = (0..SIZE).all(|i| marks[i][SIZE - 1 - i]);
    rows || cols || diag || anti
}

/// Draws the next number uniformly from those not yet called.
/// Returns `None` once all seventy-five have been called.
pub fn call_next<R: Rng + ?Sized>(state: &BingoState, rng: &mut R) -> Option<(BingoState, u8)> {
    let remaining: Vec<u8> = (1..=MAX_NUMBER).filter(|n| !state.is_called(*n)).collect();
    let number = *remaining.choose(rng)?;
    let mut next = state.clone();
    next.called.push(number);
    Some((next, number))
}

pub fn legal_moves(state: &BingoState, seat: Seat) -> Vec<BingoMove> {
    let player = seat.index();
    let mut moves = Vec::new();
    for row in 0..SIZE {
        for col in 0..SIZE {
            if !state.marked[player][row][col] && state.is_called(state.cards[player][row][col]) {
                moves.push(BingoMove { row, col });
            }
        }
    }
    moves
}
