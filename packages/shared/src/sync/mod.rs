//! Client-side room synchronisation.
//!
//! There is no push channel: a [`RoomPoller`] fetches the room on an interval,
//! diffs it against the previous snapshot and emits [`SyncEvent`]s for the
//! changes a view needs to redraw. Dropping or cancelling the handle stops
//! the loop; nothing is held server-side between polls.

pub mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::game_room::{GameRoom, RoomStatus};
use crate::services::errors::room_service_errors::RoomServiceError;
use crate::services::room_service::RoomService;

pub use http::HttpRoomSource;

#[derive(Debug)]
pub enum SyncError {
    Http(String),
    Decode(String),
    Source(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Http(msg) => write!(f, "HTTP error: {}", msg),
            SyncError::Decode(msg) => write!(f, "Decode error: {}", msg),
            SyncError::Source(msg) => write!(f, "Room source error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

/// Where a poller reads rooms from. `Ok(None)` means the room no longer exists.
#[async_trait]
pub trait RoomSource: Send + Sync {
    async fn fetch_room(&self, room_id: &str) -> Result<Option<GameRoom>, SyncError>;
}

#[async_trait]
impl RoomSource for RoomService {
    async fn fetch_room(&self, room_id: &str) -> Result<Option<GameRoom>, SyncError> {
        match self.get(room_id).await {
            Ok(room) => Ok(Some(room)),
            Err(RoomServiceError::NotFound) => Ok(None),
            Err(e) => Err(SyncError::Source(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// First successful fetch.
    Snapshot { room: GameRoom },
    Joined { player2_id: String },
    StateChanged { game_state: serde_json::Value },
    TurnChanged { current_turn: String },
    Finished { winner_id: Option<String>, is_draw: bool },
    Removed,
}

/// Changes between two consecutive observations of the same room.
pub fn diff_rooms(prev: Option<&GameRoom>, next: Option<&GameRoom>) -> Vec<SyncEvent> {
    let (prev, next) = match (prev, next) {
        (None, None) => return Vec::new(),
        (Some(_), None) => return vec![SyncEvent::Removed],
        (None, Some(next)) => return vec![SyncEvent::Snapshot { room: next.clone() }],
        (Some(prev), Some(next)) => (prev, next),
    };

    let mut events = Vec::new();
    if prev.player2_id.is_none() {
        if let Some(player2_id) = &next.player2_id {
            events.push(SyncEvent::Joined {
                player2_id: player2_id.clone(),
            });
        }
    }
    if prev.game_state != next.game_state {
        events.push(SyncEvent::StateChanged {
            game_state: next.game_state.clone(),
        });
    }
    if prev.current_turn != next.current_turn && next.status == RoomStatus::Playing {
        events.push(SyncEvent::TurnChanged {
            current_turn: next.current_turn.clone(),
        });
    }
    if prev.status != RoomStatus::Finished && next.status == RoomStatus::Finished {
        events.push(SyncEvent::Finished {
            winner_id: next.winner_id.clone(),
            is_draw: next.is_draw,
        });
    }
    events
}

/// Cancels the poll loop when dropped.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct RoomPoller;

impl RoomPoller {
    const CHANNEL_CAPACITY: usize = 32;

    /// Polls `room_id` every `interval`. The loop ends on its own once the room
    /// is finished or removed, or when the receiver is dropped.
    pub fn spawn(
        source: Arc<dyn RoomSource>,
        room_id: &str,
        interval: Duration,
    ) -> (PollerHandle, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(Self::CHANNEL_CAPACITY);
        let room_id = room_id.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<GameRoom> = None;
            let mut seen = false;
            loop {
                ticker.tick().await;
                let next = match source.fetch_room(&room_id).await {
                    Ok(next) => next,
                    Err(e) => {
                        warn!("Polling room {} failed: {}", room_id, e);
                        continue;
                    }
                };
                if !seen && next.is_none() {
                    // Never existed from this client's point of view.
                    let _ = tx.send(SyncEvent::Removed).await;
                    break;
                }
                seen = true;

                for event in diff_rooms(last.as_ref(), next.as_ref()) {
                    if tx.send(event).await.is_err() {
                        debug!("Poller for room {} lost its receiver", room_id);
                        return;
                    }
                }
                let done = next
                    .as_ref()
                    .map_or(true, |room| room.status == RoomStatus::Finished);
                if done {
                    break;
                }
                last = next;
            }
        });
        (PollerHandle { task }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game_type::GameType;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    fn room() -> GameRoom {
        GameRoom::new(GameType::Connect4, "alice", "QWERTY".to_string(), json!({"v": 0}))
    }

    #[test]
    fn test_join_and_turn_and_state_changes_are_reported() {
        let before = room();
        let mut after = before.clone();
        after.player2_id = Some("bob".to_string());
        after.status = RoomStatus::Playing;
        after.game_state = json!({"v": 1});
        after.current_turn = "bob".to_string();

        let events = diff_rooms(Some(&before), Some(&after));

        assert_eq!(
            events,
            vec![
                SyncEvent::Joined {
                    player2_id: "bob".to_string()
                },
                SyncEvent::StateChanged {
                    game_state: json!({"v": 1})
                },
                SyncEvent::TurnChanged {
                    current_turn: "bob".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_identical_rooms_produce_nothing() {
        let r = room();
        assert!(diff_rooms(Some(&r), Some(&r.clone())).is_empty());
    }

    #[test]
    fn test_finish_and_removal() {
        let before = room();
        let mut after = before.clone();
        after.status = RoomStatus::Finished;
        after.is_draw = true;

        assert_eq!(
            diff_rooms(Some(&before), Some(&after)),
            vec![SyncEvent::Finished {
                winner_id: None,
                is_draw: true
            }]
        );
        assert_eq!(diff_rooms(Some(&before), None), vec![SyncEvent::Removed]);
    }

    struct Scripted(Mutex<VecDeque<Option<GameRoom>>>);

    #[async_trait]
    impl RoomSource for Scripted {
        async fn fetch_room(&self, _room_id: &str) -> Result<Option<GameRoom>, SyncError> {
            let mut script = self.0.lock().await;
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            Ok(next.flatten())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_streams_changes_until_finished() {
        let waiting = room();
        let mut playing = waiting.clone();
        playing.player2_id = Some("bob".to_string());
        playing.status = RoomStatus::Playing;
        let mut finished = playing.clone();
        finished.status = RoomStatus::Finished;
        finished.winner_id = Some("bob".to_string());

        let source = Arc::new(Scripted(Mutex::new(VecDeque::from(vec![
            Some(waiting.clone()),
            Some(playing),
            Some(finished),
        ]))));
        let (handle, mut rx) = RoomPoller::spawn(source, &waiting.id, Duration::from_millis(100));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(events[0], SyncEvent::Snapshot { .. }));
        assert_eq!(
            events[1],
            SyncEvent::Joined {
                player2_id: "bob".to_string()
            }
        );
        assert_eq!(
            events.last(),
            Some(&SyncEvent::Finished {
                winner_id: Some("bob".to_string()),
                is_draw: false
            })
        );
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let source = Arc::new(Scripted(Mutex::new(VecDeque::from(vec![Some(room())]))));
        let (handle, mut rx) = RoomPoller::spawn(source, "any", Duration::from_millis(100));

        assert!(matches!(rx.recv().await, Some(SyncEvent::Snapshot { .. })));
        handle.cancel();

        assert_eq!(rx.recv().await, None);
    }
}
