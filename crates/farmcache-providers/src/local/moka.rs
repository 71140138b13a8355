//! Moka in-process cache tier
//!
//! High-performance concurrent local tier using Moka. Each entry carries
//! its own TTL, applied through Moka's per-entry expiry policy, so a
//! remote fallback can mirror the store's remaining TTL exactly.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use farmcache_domain::expiry::LocalEntryOptions;
use farmcache_domain::ports::LocalCacheTier;

/// Default maximum number of entries
const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct CachedEntry {
    bytes: Vec<u8>,
    ttl: Option<Duration>,
}

/// Per-entry TTL policy: entries without a TTL never expire
struct EntryTtl;

impl Expiry<String, CachedEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Moka-backed local cache tier
///
/// Thread-safe; shared between request-processing code and the
/// invalidation listener task. Eviction priority is accepted but not
/// weighted - Moka evicts by its own frequency/recency policy.
#[derive(Clone)]
pub struct MokaCacheTier {
    cache: Cache<String, CachedEntry>,
    max_capacity: u64,
}

impl MokaCacheTier {
    /// Create a tier with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a tier with a specific maximum entry count
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();
        Self {
            cache,
            max_capacity,
        }
    }

    /// The configured maximum entry count
    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }
}

impl Default for MokaCacheTier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MokaCacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheTier")
            .field("max_capacity", &self.max_capacity)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl LocalCacheTier for MokaCacheTier {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.cache.get(key).await.map(|entry| entry.bytes)
    }

    async fn insert(&self, key: &str, value: Vec<u8>, options: LocalEntryOptions) {
        let entry = CachedEntry {
            bytes: value,
            ttl: options.ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
    }

    async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect()
    }

    async fn entry_count(&self) -> u64 {
        // Run pending tasks so the count reflects completed invalidations
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    fn tier_name(&self) -> &str {
        "moka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_get_remove() {
        let tier = MokaCacheTier::new();
        tier.insert("k1", b"v1".to_vec(), LocalEntryOptions::default())
            .await;

        assert_eq!(tier.get("k1").await, Some(b"v1".to_vec()));
        assert_eq!(tier.get("missing").await, None);

        tier.remove("k1").await;
        assert_eq!(tier.get("k1").await, None);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let tier = MokaCacheTier::new();
        tier.insert("a", b"1".to_vec(), LocalEntryOptions::default())
            .await;
        tier.insert("b", b"2".to_vec(), LocalEntryOptions::default())
            .await;

        tier.clear().await;
        assert_eq!(tier.entry_count().await, 0);
        assert_eq!(tier.get("a").await, None);
    }

    #[tokio::test]
    async fn per_entry_ttl_expires() {
        let tier = MokaCacheTier::new();
        tier.insert(
            "short",
            b"v".to_vec(),
            LocalEntryOptions::with_ttl(Some(Duration::from_millis(50))),
        )
        .await;
        tier.insert("forever", b"v".to_vec(), LocalEntryOptions::default())
            .await;

        assert!(tier.get("short").await.is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(tier.get("short").await, None);
        assert!(tier.get("forever").await.is_some());
    }

    #[tokio::test]
    async fn prefix_enumeration() {
        let tier = MokaCacheTier::new();
        tier.insert("OUTPUT:7_a", b"1".to_vec(), LocalEntryOptions::default())
            .await;
        tier.insert("OUTPUT:7_b", b"2".to_vec(), LocalEntryOptions::default())
            .await;
        tier.insert("OUTPUT:8_a", b"3".to_vec(), LocalEntryOptions::default())
            .await;
        tier.cache.run_pending_tasks().await;

        let mut page7 = tier.keys_with_prefix("OUTPUT:7_").await;
        page7.sort();
        assert_eq!(page7, vec!["OUTPUT:7_a", "OUTPUT:7_b"]);
        assert_eq!(tier.keys_with_prefix("OUTPUT:").await.len(), 3);
    }
}
