use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::from_item;
use tokio::sync::Mutex;

use crate::models::game_stat::{GameResult, GameStat};
use crate::models::game_type::GameType;
use crate::repositories::errors::stats_repository_errors::StatsRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Adds one to the counter for `result`, creating the row if needed.
    async fn increment(
        &self,
        user_id: &str,
        game_type: GameType,
        result: GameResult,
    ) -> Result<(), StatsRepositoryError>;

    async fn get_user_stats(&self, user_id: &str) -> Result<Vec<GameStat>, StatsRepositoryError>;
}

/// Rows keyed by `user_id` (partition) and `game_type` (sort).
pub struct DynamoDbStatsRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbStatsRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl StatsRepository for DynamoDbStatsRepository {
    async fn increment(
        &self,
        user_id: &str,
        game_type: GameType,
        result: GameResult,
    ) -> Result<(), StatsRepositoryError> {
        // ADD is atomic server-side and creates the item and attribute on first use.
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .key("game_type", AttributeValue::S(game_type.to_string()))
            .update_expression("ADD #counter :one")
            .expression_attribute_names("#counter", result.counter())
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .send()
            .await
            .map_err(|e| StatsRepositoryError::DynamoDb(e.to_string()))?;
        Ok(())
    }

    async fn get_user_stats(&self, user_id: &str) -> Result<Vec<GameStat>, StatsRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| StatsRepositoryError::DynamoDb(e.to_string()))?;

        output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                let row: StoredStat = from_item(item)
                    .map_err(|e| StatsRepositoryError::Serialization(e.to_string()))?;
                Ok(row.into())
            })
            .collect()
    }
}

/// Counters that were never incremented are absent from the stored item.
#[derive(serde::Deserialize)]
struct StoredStat {
    user_id: String,
    game_type: GameType,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
    #[serde(default)]
    draws: u32,
}

impl From<StoredStat> for GameStat {
    fn from(row: StoredStat) -> Self {
        GameStat {
            user_id: row.user_id,
            game_type: row.game_type,
            wins: row.wins,
            losses: row.losses,
            draws: row.draws,
        }
    }
}

#[derive(Default)]
pub struct InMemoryStatsRepository {
    rows: Mutex<HashMap<(String, GameType), GameStat>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn increment(
        &self,
        user_id: &str,
        game_type: GameType,
        result: GameResult,
    ) -> Result<(), StatsRepositoryError> {
        self.rows
            .lock()
            .await
            .entry((user_id.to_string(), game_type))
            .or_insert_with(|| GameStat::new(user_id, game_type))
            .record(result);
        Ok(())
    }

    async fn get_user_stats(&self, user_id: &str) -> Result<Vec<GameStat>, StatsRepositoryError> {
        let mut stats: Vec<GameStat> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        stats.sort_by_key(|s| s.game_type.as_str());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_are_created_lazily_per_game_type() {
        let repo = InMemoryStatsRepository::new();
        assert!(repo.get_user_stats("alice").await.unwrap().is_empty());

        repo.increment("alice", GameType::Chess, GameResult::Win).await.unwrap();
        repo.increment("alice", GameType::Chess, GameResult::Loss).await.unwrap();
        repo.increment("alice", GameType::Bingo, GameResult::Draw).await.unwrap();
        repo.increment("bob", GameType::Chess, GameResult::Win).await.unwrap();

        let stats = repo.get_user_stats("alice").await.unwrap();
        assert_eq!(stats.len(), 2);
        let chess = stats.iter().find(|s| s.game_type == GameType::Chess).unwrap();
        assert_eq!((chess.wins, chess.losses, chess.draws), (1, 1, 0));
    }

    #[test]
    fn test_stored_row_tolerates_missing_counters() {
        let row: StoredStat = serde_json::from_value(serde_json::json!({
            "user_id": "alice",
            "game_type": "memory",
            "wins": 3
        }))
        .unwrap();
        let stat: GameStat = row.into();
        assert_eq!((stat.wins, stat.losses, stat.draws), (3, 0, 0));
    }
}
