//! Object-cache orchestrator
//!
//! Combines the local tier, the remote store, and the invalidation
//! channel into the `insert / get_item / remove / clear` contract used by
//! request-processing code.
//!
//! Within one process a remove or clear is applied to the local tier
//! before the remote delete and publish are attempted, so a concurrent
//! local reader never sees a removed value reappear from its own
//! process's perspective. Other processes may briefly serve a stale local
//! copy until the invalidation message is delivered - eventual, not
//! immediate, consistency across the farm.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use farmcache_domain::error::{Error, Result};
use farmcache_domain::expiry::{local_ttl, CachePriority, ExpiryPolicy, LocalEntryOptions};
use farmcache_domain::identity::InstanceId;
use farmcache_domain::messages::{CacheMessage, ChannelNames};
use farmcache_domain::ports::{CachingCapability, ChannelMessage, LocalCacheTier};

use crate::engine::CacheEngine;
use crate::invalidation::{spawn_listener, MessageDispatch};
use crate::policy::guard;

/// Two-tier object cache with cross-instance invalidation
///
/// Cheap to clone; clones share the same tiers and subscription.
/// Construction subscribes the invalidation channel, so an orchestrator
/// must be created inside a tokio runtime.
#[derive(Clone)]
pub struct CacheOrchestrator {
    inner: Arc<CacheCore>,
}

pub(crate) struct CacheCore {
    engine: Arc<CacheEngine>,
    local: Arc<dyn LocalCacheTier>,
    names: ChannelNames,
    identity: InstanceId,
}

impl CacheOrchestrator {
    /// Create the orchestrator and subscribe its invalidation channel
    pub fn new(engine: Arc<CacheEngine>, local: Arc<dyn LocalCacheTier>) -> Self {
        let prefix = engine.cache_prefix().clone();
        let names = ChannelNames::cache(&prefix);
        let identity = engine.instance_id(&prefix);
        let inner = Arc::new(CacheCore {
            engine,
            local,
            names,
            identity,
        });
        let dispatch: Arc<dyn MessageDispatch> = inner.clone();
        // Detached on purpose: the subscription is terminal for the
        // process lifetime.
        let _ = spawn_listener(
            inner.engine.remote().clone(),
            inner.names.pattern().to_string(),
            dispatch,
        );
        Self { inner }
    }

    /// This orchestrator's identity token
    pub fn instance_id(&self) -> &InstanceId {
        &self.inner.identity
    }

    /// Number of entries in the local tier
    pub async fn item_count(&self) -> u64 {
        self.inner.local.entry_count().await
    }

    /// Insert a typed value
    pub async fn insert_value<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expiry: ExpiryPolicy,
        priority: CachePriority,
    ) -> Result<()> {
        let settings = self.inner.engine.settings();
        let encoded = serde_json::to_value(value).map_err(|e| Error::NotSerializable {
            message: format!("Failed to serialize value for key '{}': {}", key, e),
            source: Some(Box::new(e)),
        });
        let result = match encoded {
            Ok(value) => self.inner.try_insert(key, &value, expiry, priority).await,
            Err(e) => Err(e),
        };
        guard(&settings, "insert", result).map(|_| ())
    }

    /// Get a typed value
    pub async fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key).await? {
            Some(value) => {
                let typed = serde_json::from_value(value).map_err(|e| Error::CorruptData {
                    message: format!("Cached value for key '{}' has the wrong shape: {}", key, e),
                    source: Some(Box::new(e)),
                })?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CachingCapability for CacheOrchestrator {
    async fn insert(
        &self,
        key: &str,
        value: serde_json::Value,
        expiry: ExpiryPolicy,
        priority: CachePriority,
    ) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self.inner.try_insert(key, &value, expiry, priority).await;
        guard(&settings, "insert", result).map(|_| ())
    }

    async fn get_item(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let settings = self.inner.engine.settings();
        let result = self.inner.try_get_item(key).await;
        // A swallowed failure degrades to a cache miss
        guard(&settings, "get_item", result).map(Option::flatten)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self.inner.remove_with_notify(key, true).await;
        guard(&settings, "remove", result).map(|_| ())
    }

    async fn clear(&self, scope: &str, scope_data: &str) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self.inner.clear_with_notify(scope, scope_data, true).await;
        guard(&settings, "clear", result).map(|_| ())
    }
}

impl CacheCore {
    fn remote_key(&self, key: &str) -> String {
        self.engine.cache_prefix().apply(key)
    }

    async fn try_insert(
        &self,
        key: &str,
        value: &serde_json::Value,
        expiry: ExpiryPolicy,
        priority: CachePriority,
    ) -> Result<()> {
        let json = serde_json::to_vec(value).map_err(|e| Error::NotSerializable {
            message: format!("Failed to serialize value for key '{}': {}", key, e),
            source: Some(Box::new(e)),
        })?;
        let ttl = expiry.remote_ttl(Utc::now());

        // Local tier first, with the caller's priority preserved
        self.local
            .insert(key, json.clone(), LocalEntryOptions { ttl, priority })
            .await;

        let encoded = self.engine.codec().encode_bytes(&json)?;
        self.engine
            .remote()
            .set(&self.remote_key(key), encoded.payload(), ttl)
            .await
        // No publish: inserts are not broadcast. Other instances simply
        // miss and refetch from the remote store on their next read.
    }

    async fn try_get_item(&self, key: &str) -> Result<Option<serde_json::Value>> {
        if let Some(bytes) = self.local.get(key).await {
            let value = serde_json::from_slice(&bytes).map_err(|e| Error::CorruptData {
                message: format!("Local entry for key '{}' is corrupt: {}", key, e),
                source: Some(Box::new(e)),
            })?;
            return Ok(Some(value));
        }

        let Some(remote_value) = self.engine.remote().get(&self.remote_key(key)).await? else {
            return Ok(None);
        };

        let json = self.engine.codec().decode_bytes(&remote_value.payload)?;
        let value: serde_json::Value =
            serde_json::from_slice(&json).map_err(|e| Error::CorruptData {
                message: format!("Remote entry for key '{}' is corrupt: {}", key, e),
                source: Some(Box::new(e)),
            })?;

        // Mirror the store's remaining TTL, capped by the sanity ceiling.
        // Sliding semantics are not reconstructed once a value was shared
        // through the remote store.
        let ttl = local_ttl(remote_value.remaining_ttl);
        self.local
            .insert(key, json, LocalEntryOptions::with_ttl(ttl))
            .await;
        Ok(Some(value))
    }

    pub(crate) async fn remove_with_notify(&self, key: &str, notify: bool) -> Result<()> {
        debug!(instance = %self.identity, key, "Removing cache key");
        self.local.remove(key).await;

        if notify {
            self.engine.remote().delete(&self.remote_key(key)).await?;
            let payload = CacheMessage::remove_payload(&self.identity, key);
            self.engine
                .remote()
                .publish(self.names.remove(), &payload)
                .await?;
        }
        Ok(())
    }

    pub(crate) async fn clear_with_notify(
        &self,
        scope: &str,
        scope_data: &str,
        notify: bool,
    ) -> Result<()> {
        info!(instance = %self.identity, scope, scope_data, "Clearing local cache");
        self.local.clear().await;

        if notify {
            let pattern = self.engine.cache_prefix().wildcard();
            self.engine.remote().delete_by_pattern(&pattern).await?;
            let payload = CacheMessage::clear_payload(&self.identity, scope, scope_data);
            self.engine
                .remote()
                .publish(self.names.clear(), &payload)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageDispatch for CacheCore {
    async fn dispatch(&self, message: ChannelMessage) {
        // Malformed payloads are indistinguishable from a foreign cache
        // generation and are dropped without logging.
        let Some(parsed) = CacheMessage::parse(&self.names, &message.channel, &message.payload)
        else {
            return;
        };
        match parsed {
            CacheMessage::Clear {
                sender,
                scope,
                scope_data,
            } => {
                if self.identity.is_self(&sender) {
                    return;
                }
                let _ = self.clear_with_notify(&scope, &scope_data, false).await;
            }
            CacheMessage::Remove { sender, key } => {
                if self.identity.is_self(&sender) {
                    return;
                }
                let _ = self.remove_with_notify(&key, false).await;
            }
        }
    }
}

impl std::fmt::Debug for CacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("instance", &self.inner.identity.as_str())
            .field("tier", &self.inner.local.tier_name())
            .finish()
    }
}
