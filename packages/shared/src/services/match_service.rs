use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::games::bingo;
use crate::games::{GameMove, GameState, Outcome, PendingKind, PendingTransition};
use crate::models::game_room::{GameRoom, RoomStatus};
use crate::models::game_type::GameType;
use crate::random::SharedRng;
use crate::services::errors::match_service_errors::MatchServiceError;
use crate::services::errors::room_service_errors::RoomServiceError;
use crate::services::room_locks::RoomGuard;
use crate::services::room_service::{LeaveOutcome, RoomService};

#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    pub bingo_call_interval: Duration,
    pub memory_reveal_delay: Duration,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {
            bingo_call_interval: Duration::from_secs(5),
            memory_reveal_delay: Duration::from_millis(1_000),
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub room: GameRoom,
    /// Present when the move decided the game.
    pub outcome: Option<Outcome>,
    pub pending: Option<PendingTransition>,
}

/// Runs a move end to end under the room lock: rules, persistence, terminal
/// check, finish and stats. Also owns the timers some games need.
pub struct MatchService {
    rooms: Arc<RoomService>,
    rng: SharedRng,
    settings: MatchSettings,
    callers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl MatchService {
    pub fn new(rooms: Arc<RoomService>, rng: SharedRng, settings: MatchSettings) -> Self {
        MatchService {
            rooms,
            rng,
            settings,
            callers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn rooms(&self) -> &Arc<RoomService> {
        &self.rooms
    }

    pub async fn join(&self, room_id: &str, joiner_id: &str) -> Result<GameRoom, MatchServiceError> {
        let room = self.rooms.join(room_id, joiner_id).await?;
        self.on_started(&room);
        Ok(room)
    }

    pub async fn join_by_code(
        &self,
        room_code: &str,
        joiner_id: &str,
    ) -> Result<GameRoom, MatchServiceError> {
        let room = self.rooms.join_by_code(room_code, joiner_id).await?;
        self.on_started(&room);
        Ok(room)
    }

    fn on_started(&self, room: &GameRoom) {
        if room.game_type == GameType::Bingo && room.status == RoomStatus::Playing {
            self.start_bingo_caller(&room.id);
        }
    }

    pub async fn submit_move(
        &self,
        room_id: &str,
        user_id: &str,
        mv: &GameMove,
    ) -> Result<MoveOutcome, MatchServiceError> {
        let guard = self.rooms.lock(room_id).await;
        let room = self.rooms.load_locked(&guard).await?;
        if room.status != RoomStatus::Playing {
            return Err(RoomServiceError::StateConflict(match room.status {
                RoomStatus::Waiting => "room is still waiting for an opponent".to_string(),
                _ => "room is already finished".to_string(),
            })
            .into());
        }
        let seat = room.seat_of(user_id).ok_or(RoomServiceError::NotParticipant)?;
        let shared = room.game_type.is_shared_seat();
        if !shared && room.current_turn != user_id {
            return Err(RoomServiceError::NotYourTurn.into());
        }

        let state: GameState = serde_json::from_value(room.game_state.clone())?;
        let transition = state.apply(mv, seat).map_err(|e| {
            debug!("Rejected move in {} from {}: {}", room.id, user_id, e);
            e
        })?;
        let value = serde_json::to_value(&transition.state)?;
        let pending = transition.pending.map(|pending| self.with_configured_delay(pending));

        let mut updated = if shared {
            self.rooms
                .update_shared_state_locked(&guard, Some(user_id), value)
                .await?
        } else {
            let next_user = room
                .user_at(transition.next)
                .ok_or(RoomServiceError::NotParticipant)?
                .to_string();
            self.rooms
                .update_state_locked(&guard, user_id, value, &next_user)
                .await?
        };

        let outcome = transition.state.terminal();
        if let Some(outcome) = outcome {
            updated = self.finish_with_outcome(&guard, &updated, outcome).await?;
        }
        drop(guard);

        if outcome.is_none() {
            if let Some(pending) = &pending {
                self.schedule_pending(room_id, pending.clone());
            }
        }

        Ok(MoveOutcome {
            room: updated,
            outcome,
            pending,
        })
    }

    /// Rules propose a default delay; the deployment's setting wins.
    fn with_configured_delay(&self, pending: PendingTransition) -> PendingTransition {
        let delay = match pending.kind {
            PendingKind::ConcealCards { .. } => self.settings.memory_reveal_delay,
        };
        PendingTransition {
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            ..pending
        }
    }

    async fn finish_with_outcome(
        &self,
        guard: &RoomGuard,
        room: &GameRoom,
        outcome: Outcome,
    ) -> Result<GameRoom, MatchServiceError> {
        let winner = outcome.winner.and_then(|seat| room.user_at(seat));
        let finished = self
            .rooms
            .finish_locked(guard, winner, outcome.is_draw)
            .await?;
        self.stop_bingo_caller(&finished.id);
        Ok(finished)
    }

    /// Every move `user_id` could submit now; empty when it is not their move.
    pub async fn legal_moves(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Vec<GameMove>, MatchServiceError> {
        let room = self.rooms.get(room_id).await?;
        let seat = room.seat_of(user_id).ok_or(RoomServiceError::NotParticipant)?;
        if room.status != RoomStatus::Playing {
            return Ok(Vec::new());
        }
        let state: GameState = serde_json::from_value(room.game_state)?;
        Ok(state.legal_moves(seat))
    }

    pub async fn finish(
        &self,
        room_id: &str,
        winner_id: Option<&str>,
        is_draw: bool,
    ) -> Result<GameRoom, MatchServiceError> {
        let room = self.rooms.finish(room_id, winner_id, is_draw).await?;
        self.stop_bingo_caller(room_id);
        Ok(room)
    }

    pub async fn leave(&self, room_id: &str, user_id: &str) -> Result<LeaveOutcome, MatchServiceError> {
        let outcome = self.rooms.leave(room_id, user_id).await?;
        self.stop_bingo_caller(room_id);
        Ok(outcome)
    }

    fn schedule_pending(&self, room_id: &str, pending: PendingTransition) {
        let rooms = self.rooms.clone();
        let room_id = room_id.to_string();
        let delay = Duration::from_millis(pending.delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = resolve_pending(&rooms, &room_id, &pending).await {
                warn!("Delayed transition for room {} failed: {}", room_id, e);
            }
        });
    }

    pub fn start_bingo_caller(&self, room_id: &str) {
        let mut callers = self.callers.lock().unwrap_or_else(|p| p.into_inner());
        if callers.get(room_id).is_some_and(|h| !h.is_finished()) {
            return;
        }
        let task = tokio::spawn(run_bingo_caller(
            self.rooms.clone(),
            self.rng.clone(),
            room_id.to_string(),
            self.settings.bingo_call_interval,
        ));
        callers.insert(room_id.to_string(), task);
        info!("Bingo caller started for room {}", room_id);
    }

    pub fn stop_bingo_caller(&self, room_id: &str) {
        let handle = self
            .callers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(room_id);
        if let Some(handle) = handle {
            handle.abort();
            info!("Bingo caller stopped for room {}", room_id);
        }
    }

    pub fn running_callers(&self) -> usize {
        self.callers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }
}

impl Drop for MatchService {
    fn drop(&mut self) {
        let callers = std::mem::take(&mut *self.callers.lock().unwrap_or_else(|p| p.into_inner()));
        for (_, handle) in callers {
            handle.abort();
        }
    }
}

async fn resolve_pending(
    rooms: &RoomService,
    room_id: &str,
    pending: &PendingTransition,
) -> Result<(), MatchServiceError> {
    let guard = rooms.lock(room_id).await;
    let room = match rooms.load_locked(&guard).await {
        Ok(room) => room,
        Err(RoomServiceError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if room.status != RoomStatus::Playing {
        return Ok(());
    }
    let state: GameState = serde_json::from_value(room.game_state)?;
    if let Some(next) = state.resolve_pending(pending) {
        let value = serde_json::to_value(&next)?;
        rooms.update_shared_state_locked(&guard, None, value).await?;
        debug!("Applied delayed transition in room {}", room_id);
    }
    Ok(())
}

/// Calls a number every `interval` until the room stops playing or every
/// number has been called.
async fn run_bingo_caller(
    rooms: Arc<RoomService>,
    rng: SharedRng,
    room_id: String,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match call_number(&rooms, &rng, &room_id).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(MatchServiceError::RoomError(RoomServiceError::StateConflict(msg))) => {
                // A concurrent write won; the next tick reads the fresh room.
                warn!("Bingo call for room {} skipped: {}", room_id, msg);
            }
            Err(e) => {
                error!("Bingo caller for room {} failed: {}", room_id, e);
                break;
            }
        }
    }
    info!("Bingo caller for room {} exited", room_id);
}

/// One caller tick. Returns whether the caller should keep running.
async fn call_number(
    rooms: &RoomService,
    rng: &SharedRng,
    room_id: &str,
) -> Result<bool, MatchServiceError> {
    let guard = rooms.lock(room_id).await;
    let room = match rooms.load_locked(&guard).await {
        Ok(room) => room,
        Err(RoomServiceError::NotFound) => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if room.status != RoomStatus::Playing {
        return Ok(false);
    }
    let GameState::Bingo(state) = serde_json::from_value::<GameState>(room.game_state)? else {
        return Ok(false);
    };

    let Some((next, number)) = rng.with(|r| bingo::call_next(&state, r)) else {
        info!("All numbers called in room {}", room_id);
        return Ok(false);
    };
    let next = GameState::Bingo(next);
    let updated = rooms
        .update_shared_state_locked(&guard, None, serde_json::to_value(&next)?)
        .await?;
    debug!("Room {} called {}", room_id, number);

    if let Some(outcome) = next.terminal() {
        let winner = outcome.winner.and_then(|seat| updated.user_at(seat));
        rooms.finish_locked(&guard, winner, outcome.is_draw).await?;
        return Ok(false);
    }
    Ok(true)
}
