use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::dispatch::Publisher;
use crate::ws::events::ServerEvent;

pub type ClientId = u64;

struct OnlineEntry {
    client_id: ClientId,
    tx: mpsc::UnboundedSender<String>,
}

/// In-memory user → connection mapping. One entry per user,
/// last-writer-wins; rebuilt empty on every process start.
pub struct PresenceTracker {
    next_id: RwLock<u64>,
    online: RwLock<HashMap<String, OnlineEntry>>,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            next_id: RwLock::new(1),
            online: RwLock::new(HashMap::new()),
        }
    }

    /// Record a user's connection, replacing any previous handle.
    pub async fn join(&self, user_id: &str, tx: mpsc::UnboundedSender<String>) -> ClientId {
        let client_id = {
            let mut id = self.next_id.write().await;
            let current = *id;
            *id += 1;
            current
        };

        self.online
            .write()
            .await
            .insert(user_id.to_string(), OnlineEntry { client_id, tx });

        client_id
    }

    /// Remove the entry owned by this connection, if it is still the
    /// latest one for its user. A reconnect that overwrote the mapping
    /// must not be evicted by the stale connection's disconnect.
    pub async fn leave(&self, client_id: ClientId) {
        let mut online = self.online.write().await;
        let stale = online
            .iter()
            .find(|(_, entry)| entry.client_id == client_id)
            .map(|(user_id, _)| user_id.clone());

        if let Some(user_id) = stale {
            online.remove(&user_id);
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.online.read().await.contains_key(user_id)
    }

    pub async fn online_count(&self) -> usize {
        self.online.read().await.len()
    }
}

#[async_trait]
impl Publisher for PresenceTracker {
    /// Best-effort push: serialize once, drop silently if the user has
    /// no live connection or the channel is closed.
    async fn notify(&self, user_id: &str, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let online = self.online.read().await;
        if let Some(entry) = online.get(user_id) {
            if entry.tx.send(msg).is_err() {
                tracing::debug!("push to {} dropped: connection closing", user_id);
            }
        }
    }
}
