//! In-memory remote store
//!
//! Process-local stand-in for the shared store: a map with absolute-instant
//! expiry plus a broadcast pub/sub fabric honoring trailing-wildcard
//! channel patterns. Backs single-instance deployments and the engine's
//! integration tests, where several orchestrators share one `Arc` of it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast;
use tracing::warn;

use farmcache_domain::error::{Error, Result};
use farmcache_domain::ports::{ChannelMessage, MessageStream, RemoteStore, RemoteValue};

/// Pub/sub channel capacity
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct StoredValue {
    payload: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Trailing-wildcard match: `prefix*` matches by prefix, anything else
/// matches exactly.
fn matches_pattern(pattern: &str, subject: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(stem) => subject.starts_with(stem),
        None => subject == pattern,
    }
}

/// In-memory remote store with broadcast pub/sub
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
    channel: broadcast::Sender<ChannelMessage>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (channel, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            channel,
        }
    }

    /// Create as `Arc` for sharing between engines
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock_err() -> Error {
        Error::transport("Memory store lock poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("MemoryStore")
            .field("entries", &entries)
            .field("subscribers", &self.channel.receiver_count())
            .finish()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn set(&self, key: &str, payload: &str, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        entries.insert(
            key.to_string(),
            StoredValue {
                payload: payload.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<RemoteValue>> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        match entries.get(key) {
            Some(value) if value.expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(value) => Ok(Some(RemoteValue {
                payload: value.payload.clone(),
                remaining_ttl: value.expires_at.map(|at| at.saturating_duration_since(now)),
            })),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        Ok(entries.remove(key).is_some())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
        let before = entries.len();
        entries.retain(|key, _| !matches_pattern(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        // A send error only means there are no subscribers
        let _ = self.channel.send(ChannelMessage {
            channel: channel.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<MessageStream> {
        let receiver = self.channel.subscribe();
        let pattern = pattern.to_string();
        let stream = stream::unfold((receiver, pattern), |(mut rx, pattern)| async move {
            loop {
                match rx.recv().await {
                    Ok(msg) if matches_pattern(&pattern, &msg.channel) => {
                        return Some((msg, (rx, pattern)));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Invalidation stream lagged by {} messages", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
