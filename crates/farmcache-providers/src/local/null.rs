//! Null local tier for testing
//!
//! A tier that stores nothing: every get is a miss, every mutation a
//! no-op. Useful for tests and for running an orchestrator in
//! remote-only mode.

use async_trait::async_trait;

use farmcache_domain::expiry::LocalEntryOptions;
use farmcache_domain::ports::LocalCacheTier;

/// Local tier that never stores anything
#[derive(Debug, Clone, Default)]
pub struct NullCacheTier;

impl NullCacheTier {
    /// Create a new null tier
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalCacheTier for NullCacheTier {
    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn insert(&self, _key: &str, _value: Vec<u8>, _options: LocalEntryOptions) {}

    async fn remove(&self, _key: &str) {}

    async fn clear(&self) {}

    async fn keys_with_prefix(&self, _prefix: &str) -> Vec<String> {
        Vec::new()
    }

    async fn entry_count(&self) -> u64 {
        0
    }

    fn tier_name(&self) -> &str {
        "null"
    }
}
