use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, error, info};

use crate::games::GameState;
use crate::models::game_room::{GameRoom, RoomListing, RoomStatus};
use crate::models::game_type::GameType;
use crate::random::SharedRng;
use crate::repositories::room_repository::RoomRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::errors::room_service_errors::RoomServiceError;
use crate::services::room_locks::{RoomGuard, RoomLocks};
use crate::services::stats_service::StatsService;

/// Upper-case letters and digits without the look-alikes I, O, 0 and 1.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ATTEMPTS: usize = 10;

/// What happened to a room its participant walked away from.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// Nobody had joined yet, so the room is gone.
    Deleted,
    /// The remaining participant was declared winner.
    Forfeited(GameRoom),
}

/// Room lifecycle: `waiting -> playing -> finished`, with deletion when the
/// creator leaves an unjoined room. Never looks inside `game_state`.
pub struct RoomService {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    stats: Arc<StatsService>,
    locks: RoomLocks,
    rng: SharedRng,
}

impl RoomService {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        stats: Arc<StatsService>,
        rng: SharedRng,
    ) -> Self {
        RoomService {
            rooms,
            users,
            stats,
            locks: RoomLocks::new(),
            rng,
        }
    }

    pub async fn lock(&self, room_id: &str) -> RoomGuard {
        self.locks.lock(room_id).await
    }

    pub async fn create(
        &self,
        game_type: GameType,
        creator_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        if creator_id.is_empty() {
            return Err(RoomServiceError::ValidationError(
                "Creator ID cannot be empty".to_string(),
            ));
        }

        let state = self.rng.with(|rng| GameState::initial(game_type, rng));
        let state = serde_json::to_value(&state)
            .map_err(|e| RoomServiceError::ValidationError(e.to_string()))?;
        let room_code = self.allocate_room_code().await?;

        let room = GameRoom::new(game_type, creator_id, room_code, state);
        self.rooms.create_room(&room).await.map_err(|e| {
            error!("Failed to create room: {}", e);
            RoomServiceError::from(e)
        })?;

        info!(
            "Room {} ({}) created by {} with code {}",
            room.id, room.game_type, creator_id, room.room_code
        );
        Ok(room)
    }

    async fn allocate_room_code(&self) -> Result<String, RoomServiceError> {
        for _ in 0..ROOM_CODE_ATTEMPTS {
            let code = self.rng.with(|rng| {
                (0..ROOM_CODE_LEN)
                    .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
                    .collect::<String>()
            });
            if self.rooms.get_active_room_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            debug!("Room code {} already in use, retrying", code);
        }
        Err(RoomServiceError::StateConflict(
            "could not allocate a unique room code".to_string(),
        ))
    }

    pub async fn get(&self, room_id: &str) -> Result<GameRoom, RoomServiceError> {
        self.rooms
            .get_room(room_id)
            .await?
            .ok_or(RoomServiceError::NotFound)
    }

    pub async fn get_by_code(&self, room_code: &str) -> Result<GameRoom, RoomServiceError> {
        self.rooms
            .get_active_room_by_code(&room_code.to_ascii_uppercase())
            .await?
            .ok_or(RoomServiceError::NotFound)
    }

    /// Waiting and playing rooms, newest first, with display names resolved.
    pub async fn list(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<RoomListing>, RoomServiceError> {
        let rooms = self.rooms.list_active_rooms(game_type).await?;
        let mut listings = Vec::with_capacity(rooms.len());
        for room in rooms {
            let player1_name = self.display_name(&room.player1_id).await;
            let player2_name = match room.player2_id.as_deref() {
                Some(id) => Some(self.display_name(id).await),
                None => None,
            };
            listings.push(RoomListing {
                room,
                player1_name,
                player2_name,
            });
        }
        Ok(listings)
    }

    async fn display_name(&self, user_id: &str) -> String {
        match self.users.get_user_by_id(user_id).await {
            Ok(user) => user.display_name,
            Err(e) => {
                debug!("No display name for {}: {}", user_id, e);
                user_id.to_string()
            }
        }
    }

    pub async fn join(&self, room_id: &str, joiner_id: &str) -> Result<GameRoom, RoomServiceError> {
        let guard = self.lock(room_id).await;
        self.join_locked(&guard, joiner_id).await
    }

    pub async fn join_by_code(
        &self,
        room_code: &str,
        joiner_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        let room = self.get_by_code(room_code).await?;
        self.join(&room.id, joiner_id).await
    }

    pub async fn join_locked(
        &self,
        guard: &RoomGuard,
        joiner_id: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        let mut room = self.load_locked(guard).await?;
        if joiner_id.is_empty() {
            return Err(RoomServiceError::ValidationError(
                "Joiner ID cannot be empty".to_string(),
            ));
        }
        if room.status == RoomStatus::Finished {
            return Err(RoomServiceError::StateConflict(
                "room is already finished".to_string(),
            ));
        }
        if room.player1_id == joiner_id {
            return Err(RoomServiceError::ValidationError(
                "cannot join your own room".to_string(),
            ));
        }
        if room.player2_id.is_some() {
            return Err(RoomServiceError::RoomFull);
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomServiceError::StateConflict(
                "room is not accepting players".to_string(),
            ));
        }

        room.player2_id = Some(joiner_id.to_string());
        room.status = RoomStatus::Playing;
        self.save(&mut room).await?;

        info!("{} joined room {}", joiner_id, room.id);
        Ok(room)
    }

    /// Persists an already-validated state and hands the turn to `next_turn`.
    pub async fn update_state(
        &self,
        room_id: &str,
        acting_user_id: &str,
        game_state: serde_json::Value,
        next_turn: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        let guard = self.lock(room_id).await;
        self.update_state_locked(&guard, acting_user_id, game_state, next_turn)
            .await
    }

    pub async fn update_state_locked(
        &self,
        guard: &RoomGuard,
        acting_user_id: &str,
        game_state: serde_json::Value,
        next_turn: &str,
    ) -> Result<GameRoom, RoomServiceError> {
        let mut room = self.load_locked(guard).await?;
        Self::require_playing(&room)?;
        if !room.is_participant(acting_user_id) {
            return Err(RoomServiceError::NotParticipant);
        }
        if room.current_turn != acting_user_id {
            debug!(
                "Rejected update on {} from {}: turn belongs to {}",
                room.id, acting_user_id, room.current_turn
            );
            return Err(RoomServiceError::NotYourTurn);
        }
        if !room.is_participant(next_turn) {
            return Err(RoomServiceError::ValidationError(
                "next turn must belong to a participant".to_string(),
            ));
        }

        room.game_state = game_state;
        room.current_turn = next_turn.to_string();
        self.save(&mut room).await?;
        Ok(room)
    }

    /// Persists a new state without touching `current_turn`, for games where
    /// both players act independently. `None` marks a system actor such as a
    /// number caller or a delayed transition.
    pub async fn update_shared_state_locked(
        &self,
        guard: &RoomGuard,
        acting_user_id: Option<&str>,
        game_state: serde_json::Value,
    ) -> Result<GameRoom, RoomServiceError> {
        let mut room = self.load_locked(guard).await?;
        Self::require_playing(&room)?;
        if let Some(user_id) = acting_user_id {
            if !room.is_participant(user_id) {
                return Err(RoomServiceError::NotParticipant);
            }
        }

        room.game_state = game_state;
        self.save(&mut room).await?;
        Ok(room)
    }

    pub async fn finish(
        &self,
        room_id: &str,
        winner_id: Option<&str>,
        is_draw: bool,
    ) -> Result<GameRoom, RoomServiceError> {
        let guard = self.lock(room_id).await;
        self.finish_locked(&guard, winner_id, is_draw).await
    }

    /// Moves a playing room to `finished` and records stats for both players.
    pub async fn finish_locked(
        &self,
        guard: &RoomGuard,
        winner_id: Option<&str>,
        is_draw: bool,
    ) -> Result<GameRoom, RoomServiceError> {
        let mut room = self.load_locked(guard).await?;
        Self::require_playing(&room)?;
        match (winner_id, is_draw) {
            (Some(_), true) => {
                return Err(RoomServiceError::ValidationError(
                    "a drawn game cannot have a winner".to_string(),
                ))
            }
            (None, false) => {
                return Err(RoomServiceError::ValidationError(
                    "a finished game needs a winner or a draw".to_string(),
                ))
            }
            (Some(winner), false) if !room.is_participant(winner) => {
                return Err(RoomServiceError::ValidationError(
                    "winner must be a participant".to_string(),
                ))
            }
            _ => {}
        }

        room.status = RoomStatus::Finished;
        room.winner_id = winner_id.map(str::to_string);
        room.is_draw = is_draw;
        self.save(&mut room).await?;
        self.locks.forget(&room.id);

        info!(
            "Room {} finished: winner={:?} draw={}",
            room.id, room.winner_id, room.is_draw
        );
        self.stats.record_room(&room).await?;
        Ok(room)
    }

    pub async fn leave(&self, room_id: &str, user_id: &str) -> Result<LeaveOutcome, RoomServiceError> {
        let guard = self.lock(room_id).await;
        self.leave_locked(&guard, user_id).await
    }

    pub async fn leave_locked(
        &self,
        guard: &RoomGuard,
        user_id: &str,
    ) -> Result<LeaveOutcome, RoomServiceError> {
        let room = self.load_locked(guard).await?;
        if !room.is_participant(user_id) {
            return Err(RoomServiceError::NotParticipant);
        }
        match room.status {
            RoomStatus::Waiting => {
                self.rooms.delete_room(&room.id, room.version).await?;
                self.locks.forget(&room.id);
                info!("Room {} deleted by its creator", room.id);
                Ok(LeaveOutcome::Deleted)
            }
            RoomStatus::Playing => {
                let winner = room
                    .opponent_of(user_id)
                    .map(str::to_string)
                    .ok_or(RoomServiceError::NotParticipant)?;
                info!("{} forfeited room {}", user_id, room.id);
                let room = self.finish_locked(guard, Some(&winner), false).await?;
                Ok(LeaveOutcome::Forfeited(room))
            }
            RoomStatus::Finished => Err(RoomServiceError::StateConflict(
                "room is already finished".to_string(),
            )),
        }
    }

    /// Writes `room` as the next version of what was loaded. Another writer
    /// landing first, even from a different process, turns into `StateConflict`.
    async fn save(&self, room: &mut GameRoom) -> Result<(), RoomServiceError> {
        let expected = room.version;
        room.version = expected + 1;
        room.updated_at = Utc::now();
        self.rooms.update_room(room, expected).await.map_err(|e| {
            debug!("Write to room {} at version {} failed: {}", room.id, expected, e);
            RoomServiceError::from(e)
        })
    }

    /// Reads the room the guard protects.
    pub async fn load_locked(&self, guard: &RoomGuard) -> Result<GameRoom, RoomServiceError> {
        self.get(guard.room_id()).await
    }

    fn require_playing(room: &GameRoom) -> Result<(), RoomServiceError> {
        match room.status {
            RoomStatus::Playing => Ok(()),
            RoomStatus::Waiting => Err(RoomServiceError::StateConflict(
                "room is still waiting for an opponent".to_string(),
            )),
            RoomStatus::Finished => Err(RoomServiceError::StateConflict(
                "room is already finished".to_string(),
            )),
        }
    }
}
