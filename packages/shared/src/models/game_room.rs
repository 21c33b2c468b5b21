use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::games::Seat;
use crate::models::game_type::GameType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRoom {
    pub id: String,
    pub game_type: GameType,
    pub room_code: String,
    pub player1_id: String,
    pub player2_id: Option<String>,
    pub status: RoomStatus,
    /// Serialized game state; its shape is owned by the rule engine for `game_type`.
    pub game_state: serde_json::Value,
    pub current_turn: String,
    pub winner_id: Option<String>,
    pub is_draw: bool,
    /// Bumped on every write; a write only lands if the stored version still matches.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameRoom {
    pub fn new(
        game_type: GameType,
        creator_id: &str,
        room_code: String,
        game_state: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        GameRoom {
            id: Uuid::new_v4().to_string(),
            game_type,
            room_code,
            player1_id: creator_id.to_string(),
            player2_id: None,
            status: RoomStatus::Waiting,
            game_state,
            current_turn: creator_id.to_string(),
            winner_id: None,
            is_draw: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn seat_of(&self, user_id: &str) -> Option<Seat> {
        if self.player1_id == user_id {
            Some(Seat::Player1)
        } else if self.player2_id.as_deref() == Some(user_id) {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    pub fn user_at(&self, seat: Seat) -> Option<&str> {
        match seat {
            Seat::Player1 => Some(self.player1_id.as_str()),
            Seat::Player2 => self.player2_id.as_deref(),
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.seat_of(user_id).is_some()
    }

    /// The other participant, if one has joined.
    pub fn opponent_of(&self, user_id: &str) -> Option<&str> {
        self.seat_of(user_id)
            .and_then(|seat| self.user_at(seat.other()))
    }

    pub fn is_active(&self) -> bool {
        self.status != RoomStatus::Finished
    }
}

/// A room as shown in the lobby, with participants resolved to display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListing {
    #[serde(flatten)]
    pub room: GameRoom,
    pub player1_name: String,
    pub player2_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> GameRoom {
        GameRoom::new(
            GameType::Connect4,
            "alice",
            "ABC234".to_string(),
            serde_json::json!({}),
        )
    }

    #[test]
    fn test_new_room_waits_for_opponent() {
        let room = room();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.current_turn, "alice");
        assert!(room.player2_id.is_none());
        assert!(room.winner_id.is_none());
        assert!(!room.is_draw);
        assert!(!room.id.is_empty());
    }

    #[test]
    fn test_seats_follow_join_order() {
        let mut room = room();
        room.player2_id = Some("bob".to_string());

        assert_eq!(room.seat_of("alice"), Some(Seat::Player1));
        assert_eq!(room.seat_of("bob"), Some(Seat::Player2));
        assert_eq!(room.seat_of("carol"), None);
        assert_eq!(room.user_at(Seat::Player2), Some("bob"));
        assert_eq!(room.opponent_of("alice"), Some("bob"));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(room()).unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["game_type"], "connect4");
        assert_eq!(json["player2_id"], serde_json::Value::Null);
    }
}
