use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_item};
use tokio::sync::RwLock;

use crate::models::game_room::{GameRoom, RoomStatus};
use crate::models::game_type::GameType;
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create_room(&self, room: &GameRoom) -> Result<(), RoomRepositoryError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, RoomRepositoryError>;
    /// Looks up a room that is not yet finished by its share code.
    async fn get_active_room_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<GameRoom>, RoomRepositoryError>;
    /// Replaces the stored room, provided its version is still `expected_version`.
    async fn update_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError>;
    async fn delete_room(
        &self,
        room_id: &str,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError>;
    /// Rooms that are waiting or playing, optionally narrowed to one game type.
    async fn list_active_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<GameRoom>, RoomRepositoryError>;
}

pub struct DynamoDbRoomRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbRoomRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn map_write_error(error_str: String) -> RoomRepositoryError {
        if error_str.contains("ConditionalCheckFailedException") {
            RoomRepositoryError::ConditionFailed
        } else {
            RoomRepositoryError::DynamoDb(error_str)
        }
    }
}

#[async_trait]
impl RoomRepository for DynamoDbRoomRepository {
    async fn create_room(&self, room: &GameRoom) -> Result<(), RoomRepositoryError> {
        let item = to_item(room).map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| Self::map_write_error(e.to_string()))?;
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, RoomRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(room_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| RoomRepositoryError::DynamoDb(e.to_string()))?;

        match output.item {
            Some(item) => {
                let room = from_item(item)
                    .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn get_active_room_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<GameRoom>, RoomRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name("GSI_RoomByCode")
            .key_condition_expression("room_code = :code")
            .filter_expression("#status <> :finished")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":code", AttributeValue::S(room_code.to_string()))
            .expression_attribute_values(":finished", AttributeValue::S("finished".to_string()))
            .send()
            .await
            .map_err(|e| RoomRepositoryError::DynamoDb(e.to_string()))?;

        match output.items.and_then(|items| items.into_iter().next()) {
            Some(item) => {
                let room = from_item(item)
                    .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn update_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        let item = to_item(room).map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected", AttributeValue::N(expected_version.to_string()))
            .send()
            .await
            .map_err(|e| Self::map_write_error(e.to_string()))?;
        Ok(())
    }

    async fn delete_room(
        &self,
        room_id: &str,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(room_id.to_string()))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected", AttributeValue::N(expected_version.to_string()))
            .send()
            .await
            .map_err(|e| Self::map_write_error(e.to_string()))?;
        Ok(())
    }

    async fn list_active_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<GameRoom>, RoomRepositoryError> {
        let mut filter = "#status IN (:waiting, :playing)".to_string();
        if game_type.is_some() {
            filter.push_str(" AND game_type = :game_type");
        }

        let mut rooms = Vec::new();
        let mut start_key = None;
        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(&filter)
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(":waiting", AttributeValue::S("waiting".to_string()))
                .expression_attribute_values(":playing", AttributeValue::S("playing".to_string()))
                .set_exclusive_start_key(start_key.take());
            if let Some(game_type) = game_type {
                request = request
                    .expression_attribute_values(":game_type", AttributeValue::S(game_type.to_string()));
            }

            let output = request
                .send()
                .await
                .map_err(|e| RoomRepositoryError::DynamoDb(e.to_string()))?;
            for item in output.items.unwrap_or_default() {
                let room: GameRoom = from_item(item)
                    .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
                rooms.push(room);
            }
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }
}

/// Process-local store for single-instance deployments and tests.
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<String, GameRoom>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, room: &GameRoom) -> Result<(), RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) {
            return Err(RoomRepositoryError::ConditionFailed);
        }
        rooms.insert(room.id.clone(), room.clone());
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, RoomRepositoryError> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn get_active_room_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<GameRoom>, RoomRepositoryError> {
        Ok(self
            .rooms
            .read()
            .await
            .values()
            .find(|r| r.room_code == room_code && r.is_active())
            .cloned())
    }

    async fn update_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(&room.id) {
            Some(existing) if existing.version == expected_version => {
                *existing = room.clone();
                Ok(())
            }
            _ => Err(RoomRepositoryError::ConditionFailed),
        }
    }

    async fn delete_room(
        &self,
        room_id: &str,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get(room_id) {
            None => Err(RoomRepositoryError::NotFound),
            Some(existing) if existing.version != expected_version => {
                Err(RoomRepositoryError::ConditionFailed)
            }
            Some(_) => {
                rooms.remove(room_id);
                Ok(())
            }
        }
    }

    async fn list_active_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<GameRoom>, RoomRepositoryError> {
        let mut rooms: Vec<GameRoom> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|r| matches!(r.status, RoomStatus::Waiting | RoomStatus::Playing))
            .filter(|r| game_type.map_or(true, |g| r.game_type == g))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }
}
