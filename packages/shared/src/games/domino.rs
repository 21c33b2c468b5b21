use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use super::{Exhaustion, GameRules, MoveError, Outcome, Seat, Transition};

pub const MAX_PIPS: u8 = 6;
pub const HAND_SIZE: usize = 7;
/// Consecutive passes that end the game as blocked.
pub const BLOCKING_PASSES: u8 = 2;

/// A tile as placed: `.0` faces left, `.0` and `.1` compare unordered.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Tile(pub u8, pub u8);

impl Tile {
    pub fn flipped(self) -> Tile {
        Tile(self.1, self.0)
    }

    pub fn pips(self) -> u32 {
        u32::from(self.0) + u32::from(self.1)
    }

    pub fn has(self, value: u8) -> bool {
        self.0 == value || self.1 == value
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Tile) -> bool {
        (self.0 == other.0 && self.1 == other.1) || (self.0 == other.1 && self.1 == other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominoState {
    pub hands: [Vec<Tile>; 2],
    /// Placed tiles, left to right, each oriented so neighbours touch.
    pub board: Vec<Tile>,
    pub pool: Vec<Tile>,
    pub active: Seat,
    pub passes: u8,
}

impl DominoState {
    pub fn ends(&self) -> Option<(u8, u8)> {
        Some((self.board.first()?.0, self.board.last()?.1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DominoMove {
    Play { tile: Tile, side: Side },
    Draw,
    Pass,
}

/// What the active player is able to do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominoAction {
    Play,
    Draw,
    Pass,
}

pub struct Domino;

impl GameRules for Domino {
    type State = DominoState;
    type Move = DominoMove;

    fn initial_state<R: Rng + ?Sized>(rng: &mut R) -> DominoState {
        let mut set: Vec<Tile> = (0..=MAX_PIPS)
            .flat_map(|a| (a..=MAX_PIPS).map(move |b| Tile(a, b)))
            .collect();
        set.shuffle(rng);
        let pool = set.split_off(HAND_SIZE * 2);
        let second = set.split_off(HAND_SIZE);
        DominoState {
            hands: [set, second],
            board: Vec::new(),
            pool,
            active: Seat::Player1,
            passes: 0,
        }
    }

    fn apply_move(
        state: &DominoState,
        mv: &DominoMove,
        seat: Seat,
    ) -> Result<Transition<DominoState>, MoveError> {
        if Self::terminal(state).is_some() {
            return Err(MoveError::GameOver);
        }
        if seat != state.active {
            return Err(MoveError::OutOfTurn);
        }
        let hand = &state.hands[seat.index()];

        match mv {
            DominoMove::Play { tile, side } => {
                let position = hand
                    .iter()
                    .position(|t| t == tile)
                    .ok_or_else(|| MoveError::rule("tile is not in your hand"))?;
                let Some(placed) = fit(state, *tile, *side) else {
                    return Err(match available_action(state, seat) {
                        DominoAction::Play => MoveError::rule("tile does not match that end"),
                        DominoAction::Draw => MoveError::Exhaustion(Exhaustion::MustDraw),
                        DominoAction::Pass => MoveError::Exhaustion(Exhaustion::MustPass),
                    });
                };

                let mut next = state.clone();
                next.hands[seat.index()].remove(position);
                match side {
                    Side::Left => next.board.insert(0, placed),
                    Side::Right => next.board.push(placed),
                }
                next.passes = 0;
                next.active = seat.other();
                Ok(Transition::to(next, seat.other()))
            }
            DominoMove::Draw => {
                if has_playable(state, seat) {
                    return Err(MoveError::rule("you have a playable tile"));
                }
                let mut next = state.clone();
                let drawn = next
                    .pool
                    .pop()
                    .ok_or(MoveError::Exhaustion(Exhaustion::MustPass))?;
                next.hands[seat.index()].push(drawn);
                // The drawing player keeps the turn until they can play or must pass.
                Ok(Transition::to(next, seat))
            }
            DominoMove::Pass => {
                if has_playable(state, seat) {
                    return Err(MoveError::rule("you have a playable tile"));
                }
                if !state.pool.is_empty() {
                    return Err(MoveError::Exhaustion(Exhaustion::MustDraw));
                }
                let mut next = state.clone();
                next.passes += 1;
                next.active = seat.other();
                Ok(Transition::to(next, seat.other()))
            }
        }
    }

    fn terminal(state: &DominoState) -> Option<Outcome> {
        if state.hands[0].is_empty() {
            return Some(Outcome::win(Seat::Player1));
        }
        if state.hands[1].is_empty() {
            return Some(Outcome::win(Seat::Player2));
        }
        if state.passes < BLOCKING_PASSES {
            return None;
        }
        let [p1, p2] = [0, 1].map(|i| state.hands[i].iter().map(|t| t.pips()).sum::<u32>());
        Some(match p1.cmp(&p2) {
            std::cmp::Ordering::Less => Outcome::win(Seat::Player1),
            std::cmp::Ordering::Greater => Outcome::win(Seat::Player2),
            std::cmp::Ordering::Equal => Outcome::draw(),
        })
    }
}

/// Orients `tile` so it touches `side`'s open end, or `None` if it does not match.
fn fit(state: &DominoState, tile: Tile, side: Side) -> Option<Tile> {
    let Some((left, right)) = state.ends() else {
        return Some(tile);
    };
    match side {
        Side::Left if tile.1 == left => Some(tile),
        Side::Left if tile.0 == left => Some(tile.flipped()),
        Side::Right if tile.0 == right => Some(tile),
        Side::Right if tile.1 == right => Some(tile.flipped()),
        _ => None,
    }
}

fn has_playable(state: &DominoState, seat: Seat) -> bool {
    match state.ends() {
        None => !state.hands[seat.index()].is_empty(),
        Some((left, right)) => state.hands[seat.index()]
            .iter()
            .any(|t| t.has(left) || t.has(right)),
    }
}

pub fn available_action(state: &DominoState, seat: Seat) -> DominoAction {
    if has_playable(state, seat) {
        DominoAction::Play
    } else if !state.pool.is_empty() {
        DominoAction::Draw
    } else {
        DominoAction::Pass
    }
}

pub fn legal_moves(state: &DominoState, seat: Seat) -> Vec<DominoMove> {
    if seat != state.active {
        return Vec::new();
    }
    match available_action(state, seat) {
        DominoAction::Draw => vec![DominoMove::Draw],
        DominoAction::Pass => vec![DominoMove::Pass],
        DominoAction::Play => state.hands[seat.index()]
            .iter()
            .flat_map(|&tile| {
                [Side::Left, Side::Right]
                    .into_iter()
                    .filter(move |&side| fit(state, tile, side).is_some())
                    .map(move |side| DominoMove::Play { tile, side })
            })
            .collect(),
    }
}
