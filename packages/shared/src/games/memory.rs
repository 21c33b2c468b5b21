use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use super::{GameRules, MoveError, Outcome, PendingKind, PendingTransition, Seat, Transition};

pub const PAIRS: u8 = 12;
pub const CARDS: usize = PAIRS as usize * 2;
/// How long a mismatched pair stays visible before it is turned back.
pub const REVEAL_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub pair_id: u8,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    pub cards: Vec<Card>,
    pub active: Seat,
    pub scores: [u32; 2],
    /// A mismatched pair still face-up, waiting to be concealed.
    #[serde(default)]
    pub pending_conceal: Option<[usize; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMove {
    pub index: usize,
}

pub struct Memory;

impl GameRules for Memory {
    type State = MemoryState;
    type Move = MemoryMove;

    fn initial_state<R: Rng + ?Sized>(rng: &mut R) -> MemoryState {
        let mut pair_ids: Vec<u8> = (0..PAIRS).chain(0..PAIRS).collect();
        pair_ids.shuffle(rng);
        MemoryState {
            cards: pair_ids
                .into_iter()
                .map(|pair_id| Card {
                    pair_id,
                    face_up: false,
                    matched: false,
                })
                .collect(),
            active: Seat::Player1,
            scores: [0, 0],
            pending_conceal: None,
        }
    }

    fn apply_move(
        state: &MemoryState,
        mv: &MemoryMove,
        seat: Seat,
    ) -> Result<Transition<MemoryState>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if seat != state.active {
            return Err(MoveError::OutOfTurn);
        }

        // A flip made before the timer fires settles the previous mismatch first.
        let mut next = match state.pending_conceal {
            Some(indices) => conceal(state, indices).unwrap_or_else(|| state.clone()),
            None => state.clone(),
        };

        let card = next
            .cards
            .get(mv.index)
            .ok_or_else(|| MoveError::rule("card index is outside the board"))?;
        if card.matched {
            return Err(MoveError::rule("card is already matched"));
        }
        if card.face_up {
            return Err(MoveError::rule("card is already face up"));
        }
        next.cards[mv.index].face_up = true;

        let revealed: Vec<usize> = next
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.face_up && !c.matched)
            .map(|(i, _)| i)
            .collect();
        let [first, second] = match revealed.as_slice() {
            [a, b] => [*a, *b],
            _ => return Ok(Transition::to(next, seat)),
        };

        if next.cards[first].pair_id == next.cards[second].pair_id {
            next.cards[first].matched = true;
            next.cards[second].matched = true;
            next.scores[seat.index()] += 1;
            return Ok(Transition::to(next, seat));
        }

        next.pending_conceal = Some([first, second]);
        next.active = seat.other();
        Ok(Transition {
            state: next,
            next: seat.other(),
            pending: Some(PendingTransition {
                delay_ms: REVEAL_DELAY_MS,
                kind: PendingKind::ConcealCards {
                    indices: [first, second],
                },
            }),
        })
    }

    fn terminal(state: &MemoryState) -> Option<Outcome> {
        if !state.cards.iter().all(|c| c.matched) {
            return None;
        }
        let [p1, p2] = state.scores;
        Some(match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => Outcome::win(Seat::Player1),
            std::cmp::Ordering::Less => Outcome::win(Seat::Player2),
            std::cmp::Ordering::Equal => Outcome::draw(),
        })
    }
}

/// Turns a pending mismatched pair face-down. `None` if that pair is no longer pending.
pub fn conceal(state: &MemoryState, indices: [usize; 2]) -> Option<MemoryState> {
    if state.pending_conceal != Some(indices) {
        return None;
    }
    let mut next = state.clone();
    for i in indices {
        if let Some(card) = next.cards.get_mut(i) {
            card.face_up = false;
        }
    }
    next.pending_conceal = None;
    Some(next)
}

pub fn legal_moves(state: &MemoryState, seat: Seat) -> Vec<MemoryMove> {
    if seat != state.active {
        return Vec::new();
    }
    let pending = state.pending_conceal.unwrap_or([usize::MAX; 2]);
    state
        .cards
        .iter()
        .enumerate()
        .filter(|(i, c)| !c.matched && (!c.face_up || pending.contains(i)))
        .map(|(index, _)| MemoryMove { index })
        .collect()
}
