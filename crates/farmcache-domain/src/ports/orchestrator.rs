//! Orchestrator capability interfaces
//!
//! The two orchestrators are structurally identical instantiations of the
//! same local ⇄ remote ⇄ invalidation pattern; these traits are the
//! contracts request-processing code programs against. The object cache
//! works over structured JSON values; the output cache over byte-stream
//! page fragments keyed by `(page, variation)`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::expiry::{CachePriority, ExpiryPolicy};

/// Capability contract of the object-cache orchestrator
#[async_trait]
pub trait CachingCapability: Send + Sync {
    /// Write a value to both tiers; inserts are not broadcast
    async fn insert(
        &self,
        key: &str,
        value: serde_json::Value,
        expiry: ExpiryPolicy,
        priority: CachePriority,
    ) -> Result<()>;

    /// Read a value: local tier first, remote fallback on miss
    async fn get_item(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Remove from both tiers and announce the removal
    async fn remove(&self, key: &str) -> Result<()>;

    /// Clear a scope from both tiers and announce the clear
    async fn clear(&self, scope: &str, scope_data: &str) -> Result<()>;
}

/// Capability contract of the output-cache orchestrator
#[async_trait]
pub trait OutputCachingCapability: Send + Sync {
    /// Build the cache key for a page and its variation parameters
    fn generate_key(&self, page_id: i64, vary_by: &BTreeMap<String, String>) -> String;

    /// Read a page fragment: local tier first, remote fallback on miss
    async fn get_output(&self, page_id: i64, cache_key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a page fragment to both tiers with a duration-based expiry
    async fn set_output(
        &self,
        page_id: i64,
        cache_key: &str,
        duration: Duration,
        output: &[u8],
    ) -> Result<()>;

    /// Drop every variation of one page and announce the removal
    async fn remove(&self, page_id: i64) -> Result<()>;

    /// Purge a site's cached output and announce the purge
    async fn purge(&self, site_id: i64) -> Result<()>;

    /// Purge entries older than their expiry age
    ///
    /// Unsupported by the remote store (no per-key age index cheap enough
    /// to scan); always fails fast rather than silently doing nothing.
    async fn purge_expired(&self, site_id: i64) -> Result<()>;
}
