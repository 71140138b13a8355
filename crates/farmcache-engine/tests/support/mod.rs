//! Shared fixtures for the engine integration tests

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use farmcache_domain::error::{Error, Result};
use farmcache_domain::ports::{MessageStream, RemoteStore, RemoteValue};
use farmcache_domain::settings::CacheSettings;
use farmcache_engine::{CacheEngine, CacheOrchestrator, OutputCacheOrchestrator, SettingsStore};
use farmcache_providers::local::MokaCacheTier;

/// Settings for a test farm
pub fn farm_settings(key_prefix: &str, silent_mode: bool) -> CacheSettings {
    CacheSettings {
        key_prefix: key_prefix.to_string(),
        silent_mode,
        ..Default::default()
    }
}

/// Engine with an explicit host identity over a shared store
pub fn engine_on(
    store: Arc<dyn RemoteStore>,
    settings: CacheSettings,
    host: &str,
) -> Arc<CacheEngine> {
    CacheEngine::with_identity(SettingsStore::new(settings), store, host, 1)
}

/// Cache orchestrator instance with its own Moka tier
pub fn cache_instance(
    store: Arc<dyn RemoteStore>,
    settings: CacheSettings,
    host: &str,
) -> CacheOrchestrator {
    CacheOrchestrator::new(engine_on(store, settings, host), Arc::new(MokaCacheTier::new()))
}

/// Output orchestrator instance with its own Moka tier
pub fn output_instance(
    store: Arc<dyn RemoteStore>,
    settings: CacheSettings,
    host: &str,
) -> OutputCacheOrchestrator {
    OutputCacheOrchestrator::new(engine_on(store, settings, host), Arc::new(MokaCacheTier::new()))
}

/// Poll a condition until it holds or a second passes
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Give freshly-spawned invalidation listeners time to subscribe
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// Remote store where every operation fails with a transport error,
/// standing in for an unreachable server
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl RemoteStore for FailingStore {
    async fn set(&self, _key: &str, _payload: &str, _ttl: Option<Duration>) -> Result<()> {
        Err(Error::transport("connection refused"))
    }

    async fn get(&self, _key: &str) -> Result<Option<RemoteValue>> {
        Err(Error::transport("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(Error::transport("connection refused"))
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64> {
        Err(Error::transport("connection refused"))
    }

    async fn publish(&self, _channel: &str, _payload: &str) -> Result<()> {
        Err(Error::transport("connection refused"))
    }

    async fn subscribe(&self, _pattern: &str) -> Result<MessageStream> {
        // Never yields; keeps the listener parked without erroring
        Ok(Box::pin(futures::stream::pending()))
    }

    fn store_name(&self) -> &str {
        "failing"
    }
}
