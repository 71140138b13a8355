//! Remote Store Port
//!
//! The shared key-value store reachable by every process in the farm:
//! GET/SET with TTL, pattern-based bulk delete, and publish/subscribe for
//! the invalidation channels. Implementations report transport failures
//! as [`Error::Transport`](crate::Error::Transport); the silent-mode
//! policy above decides whether they surface.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// A value read back from the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteValue {
    /// The stored payload (codec output)
    pub payload: String,
    /// Remaining TTL as reported by the store; `None` means no expiry
    pub remaining_ttl: Option<Duration>,
}

/// A message delivered on a subscribed channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Channel the message arrived on
    pub channel: String,
    /// Raw message payload
    pub payload: String,
}

/// Stream of messages from a channel-pattern subscription
pub type MessageStream = Pin<Box<dyn Stream<Item = ChannelMessage> + Send>>;

/// Port for the shared remote key-value store
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Write a payload under a key with an optional TTL
    async fn set(&self, key: &str, payload: &str, ttl: Option<Duration>) -> Result<()>;

    /// Read a payload and its remaining TTL
    async fn get(&self, key: &str) -> Result<Option<RemoteValue>>;

    /// Delete one key; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Delete every key matching a trailing-wildcard pattern
    ///
    /// Must execute as a single server-side bulk operation, chunking
    /// internally when the candidate set is large; returns the number of
    /// keys deleted.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64>;

    /// Publish a payload on a channel
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;

    /// Subscribe to a trailing-wildcard channel pattern
    async fn subscribe(&self, pattern: &str) -> Result<MessageStream>;

    /// Identifier of this store implementation (e.g. "redis", "memory")
    fn store_name(&self) -> &str;
}
