//! Local Cache Tier Port
//!
//! The in-process, per-instance tier: fastest path, not shared across
//! processes. The same handle is mutated by request-processing code and
//! by the invalidation listener task, so implementations must be
//! thread-safe.
//!
//! Entries are stored in their serialized (JSON) byte form; the
//! orchestrator decodes on read. Local-tier operations are infallible by
//! contract: an in-process store has no transport to fail.

use async_trait::async_trait;

use crate::expiry::LocalEntryOptions;

/// Port for the in-process cache tier
#[async_trait]
pub trait LocalCacheTier: Send + Sync + std::fmt::Debug {
    /// Get the stored bytes for a key, if present and unexpired
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Insert or replace an entry
    async fn insert(&self, key: &str, value: Vec<u8>, options: LocalEntryOptions);

    /// Remove an entry
    async fn remove(&self, key: &str);

    /// Drop every entry
    async fn clear(&self);

    /// Enumerate keys starting with a prefix
    ///
    /// The output orchestrator uses this to answer "which keys belong to
    /// page X"; the underlying store has no native prefix query.
    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Number of live entries
    async fn entry_count(&self) -> u64;

    /// Identifier of this tier implementation (e.g. "moka", "null")
    fn tier_name(&self) -> &str;
}
