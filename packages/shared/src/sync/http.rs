use async_trait::async_trait;
use reqwest::StatusCode;

use super::{RoomSource, SyncError};
use crate::models::game_room::GameRoom;

/// Reads rooms from the HTTP API with a bearer token.
pub struct HttpRoomSource {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRoomSource {
    pub fn new(base_url: &str, token: &str) -> Self {
        HttpRoomSource {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn room_url(&self, room_id: &str) -> String {
        format!("{}/rooms/{}", self.base_url, room_id)
    }
}

#[async_trait]
impl RoomSource for HttpRoomSource {
    async fn fetch_room(&self, room_id: &str) -> Result<Option<GameRoom>, SyncError> {
        let response = self
            .client
            .get(self.room_url(room_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<GameRoom>()
                .await
                .map(Some)
                .map_err(|e| SyncError::Decode(e.to_string())),
            status => Err(SyncError::Http(format!("unexpected status {}", status))),
        }
    }
}
