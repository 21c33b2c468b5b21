use std::sync::Arc;

use tracing::{debug, error};

use crate::models::game_room::GameRoom;
use crate::models::game_stat::{GameResult, GameStat};
use crate::models::game_type::GameType;
use crate::repositories::stats_repository::StatsRepository;
use crate::services::errors::stats_service_errors::StatsServiceError;

/// Per-user win/loss/draw counters, one row per game type.
pub struct StatsService {
    repository: Arc<dyn StatsRepository + Send + Sync>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn StatsRepository + Send + Sync>) -> Self {
        StatsService { repository }
    }

    pub async fn record(
        &self,
        user_id: &str,
        game_type: GameType,
        result: GameResult,
    ) -> Result<(), StatsServiceError> {
        if user_id.is_empty() {
            return Err(StatsServiceError::ValidationError(
                "User ID cannot be empty".to_string(),
            ));
        }
        debug!("Recording {:?} at {} for {}", result, game_type, user_id);
        self.repository
            .increment(user_id, game_type, result)
            .await
            .map_err(|e| {
                error!("Failed to record result for {}: {}", user_id, e);
                StatsServiceError::from(e)
            })
    }

    /// Records the finished room's outcome once for each participant.
    pub async fn record_room(&self, room: &GameRoom) -> Result<(), StatsServiceError> {
        let participants = std::iter::once(room.player1_id.as_str()).chain(room.player2_id.as_deref());
        for user_id in participants {
            let result = if room.is_draw {
                GameResult::Draw
            } else if room.winner_id.as_deref() == Some(user_id) {
                GameResult::Win
            } else {
                GameResult::Loss
            };
            self.record(user_id, room.game_type, result).await?;
        }
        Ok(())
    }

    pub async fn get_user_stats(&self, user_id: &str) -> Result<Vec<GameStat>, StatsServiceError> {
        if user_id.is_empty() {
            return Err(StatsServiceError::ValidationError(
                "User ID cannot be empty".to_string(),
            ));
        }
        Ok(self.repository.get_user_stats(user_id).await?)
    }
}
