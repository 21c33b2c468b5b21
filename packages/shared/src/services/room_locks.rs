use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per room id. Mutations of a room run while holding its guard,
/// so read-validate-write sequences on the same room never interleave.
#[derive(Clone, Default)]
pub struct RoomLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Proof that the caller holds the lock for `room_id`.
pub struct RoomGuard {
    room_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl RoomGuard {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, room_id: &str) -> RoomGuard {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
            map.entry(room_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        RoomGuard {
            room_id: room_id.to_string(),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Drops the registry entry of a room that will never be mutated again.
    pub fn forget(&self, room_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(room_id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
