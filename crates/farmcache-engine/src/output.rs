//! Output-cache orchestrator
//!
//! The same local ⇄ remote ⇄ invalidation pattern as the object cache,
//! specialized to byte-stream page fragments keyed by
//! `(page, variation)`. The local tier has no native prefix query, so
//! page membership is answered by key enumeration; remote removals use a
//! key-prefix scan scoped to the page.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use farmcache_domain::error::{Error, Result};
use farmcache_domain::expiry::{local_ttl, LocalEntryOptions};
use farmcache_domain::identity::InstanceId;
use farmcache_domain::keys::OUTPUT_KEY_SPACE;
use farmcache_domain::messages::{ChannelNames, OutputMessage};
use farmcache_domain::ports::{ChannelMessage, LocalCacheTier, OutputCachingCapability};

use crate::engine::CacheEngine;
use crate::invalidation::{spawn_listener, MessageDispatch};
use crate::policy::guard;

/// Two-tier page-output cache with cross-instance invalidation
///
/// Cheap to clone; clones share the same tiers and subscription.
#[derive(Clone)]
pub struct OutputCacheOrchestrator {
    inner: Arc<OutputCore>,
}

pub(crate) struct OutputCore {
    engine: Arc<CacheEngine>,
    local: Arc<dyn LocalCacheTier>,
    names: ChannelNames,
    identity: InstanceId,
}

/// Local key prefix holding every variation of one page
fn page_prefix(page_id: i64) -> String {
    format!("{}{}_", OUTPUT_KEY_SPACE, page_id)
}

impl OutputCacheOrchestrator {
    /// Create the orchestrator and subscribe its invalidation channel
    pub fn new(engine: Arc<CacheEngine>, local: Arc<dyn LocalCacheTier>) -> Self {
        let prefix = engine.output_prefix().clone();
        let names = ChannelNames::output(&prefix);
        let identity = engine.instance_id(&prefix);
        let inner = Arc::new(OutputCore {
            engine,
            local,
            names,
            identity,
        });
        let dispatch: Arc<dyn MessageDispatch> = inner.clone();
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

    /// Number of cached page fragments in the local tier
    pub async fn item_count(&self) -> usize {
        self.inner
            .local
            .keys_with_prefix(OUTPUT_KEY_SPACE)
            .await
            .len()
    }

    /// Number of cached variations of one page in the local tier
    pub async fn variation_count(&self, page_id: i64) -> usize {
        self.inner
            .local
            .keys_with_prefix(&page_prefix(page_id))
            .await
            .len()
    }
}

#[async_trait]
impl OutputCachingCapability for OutputCacheOrchestrator {
    fn generate_key(&self, page_id: i64, vary_by: &BTreeMap<String, String>) -> String {
        let mut hasher = Sha256::new();
        for (name, value) in vary_by {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
        format!(
            "{}{}_{}",
            OUTPUT_KEY_SPACE,
            page_id,
            hex::encode(hasher.finalize())
        )
    }

    async fn get_output(&self, _page_id: i64, cache_key: &str) -> Result<Option<Vec<u8>>> {
        let settings = self.inner.engine.settings();
        let result = self.inner.try_get_output(cache_key).await;
        guard(&settings, "get_output", result).map(Option::flatten)
    }

    async fn set_output(
        &self,
        page_id: i64,
        cache_key: &str,
        duration: Duration,
        output: &[u8],
    ) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self
            .inner
            .try_set_output(page_id, cache_key, duration, output)
            .await;
        guard(&settings, "set_output", result).map(|_| ())
    }

    async fn remove(&self, page_id: i64) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self.inner.remove_with_notify(page_id, true).await;
        guard(&settings, "remove", result).map(|_| ())
    }

    async fn purge(&self, site_id: i64) -> Result<()> {
        let settings = self.inner.engine.settings();
        let result = self.inner.purge_with_notify(site_id, true).await;
        guard(&settings, "purge", result).map(|_| ())
    }

    async fn purge_expired(&self, _site_id: i64) -> Result<()> {
        // The remote store has no per-key age index cheap enough to scan;
        // failing fast beats a silent no-op the caller would mistake for
        // a purge.
        Err(Error::unsupported(
            "Purging output entries by expiry age is not supported by the remote store",
        ))
    }
}

impl OutputCore {
    fn remote_key(&self, cache_key: &str) -> String {
        self.engine.output_prefix().apply(cache_key)
    }

    async fn try_set_output(
        &self,
        page_id: i64,
        cache_key: &str,
        duration: Duration,
        output: &[u8],
    ) -> Result<()> {
        debug!(instance = %self.identity, page_id, cache_key, "Caching page output");
        // The duration is already "now + duration" normalized; both tiers
        // receive the same TTL.
        let ttl = Some(duration);
        self.local
            .insert(cache_key, output.to_vec(), LocalEntryOptions::with_ttl(ttl))
            .await;

        let encoded = self.engine.codec().encode_bytes(output)?;
        self.engine
            .remote()
            .set(&self.remote_key(cache_key), encoded.payload(), ttl)
            .await
    }

    async fn try_get_output(&self, cache_key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(bytes) = self.local.get(cache_key).await {
            return Ok(Some(bytes));
        }

        let Some(remote_value) = self.engine.remote().get(&self.remote_key(cache_key)).await?
        else {
            return Ok(None);
        };

        let bytes = self.engine.codec().decode_bytes(&remote_value.payload)?;
        let ttl = local_ttl(remote_value.remaining_ttl);
        self.local
            .insert(cache_key, bytes.clone(), LocalEntryOptions::with_ttl(ttl))
            .await;
        Ok(Some(bytes))
    }

    pub(crate) async fn remove_with_notify(&self, page_id: i64, notify: bool) -> Result<()> {
        info!(instance = %self.identity, page_id, "Removing cached page output");
        for key in self.local.keys_with_prefix(&page_prefix(page_id)).await {
            self.local.remove(&key).await;
        }

        if notify {
            let pattern = format!("{}*", self.remote_key(&page_prefix(page_id)));
            self.engine.remote().delete_by_pattern(&pattern).await?;
            let payload = OutputMessage::remove_payload(&self.identity, page_id);
            self.engine
                .remote()
                .publish(self.names.remove(), &payload)
                .await?;
        }
        Ok(())
    }

    pub(crate) async fn purge_with_notify(&self, site_id: i64, notify: bool) -> Result<()> {
        info!(instance = %self.identity, site_id, "Purging local output cache");
        for key in self.local.keys_with_prefix(OUTPUT_KEY_SPACE).await {
            self.local.remove(&key).await;
        }

        if notify {
            let pattern = format!("{}*", self.remote_key(OUTPUT_KEY_SPACE));
            self.engine.remote().delete_by_pattern(&pattern).await?;
            let payload = OutputMessage::clear_payload(&self.identity, site_id);
            self.engine
                .remote()
                .publish(self.names.clear(), &payload)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageDispatch for OutputCore {
    async fn dispatch(&self, message: ChannelMessage) {
        let Some(parsed) = OutputMessage::parse(&self.names, &message.channel, &message.payload)
        else {
            return;
        };
        match parsed {
            OutputMessage::Clear { sender, site_id } => {
                if self.identity.is_self(&sender) {
                    return;
                }
                let _ = self.purge_with_notify(site_id, false).await;
            }
            OutputMessage::Remove { sender, page_id } => {
                if self.identity.is_self(&sender) {
                    return;
                }
                let _ = self.remove_with_notify(page_id, false).await;
            }
        }
    }
}

impl std::fmt::Debug for OutputCacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCacheOrchestrator")
            .field("instance", &self.inner.identity.as_str())
            .field("tier", &self.inner.local.tier_name())
            .finish()
    }
}
