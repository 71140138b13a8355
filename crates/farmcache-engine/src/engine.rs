//! Cache engine
//!
//! The process-wide context the orchestrators share: the remote store
//! handle, the settings store, and the identity scheme. Constructed
//! explicitly once at process start and passed around as an `Arc` -
//! there are no lazy statics. The engine lives for the process lifetime;
//! process exit releases it.

use std::sync::Arc;

use farmcache_domain::error::Result;
use farmcache_domain::identity::InstanceId;
use farmcache_domain::keys::KeyPrefix;
use farmcache_domain::ports::RemoteStore;
use farmcache_domain::settings::CacheSettings;
use farmcache_providers::codec::ValueCodec;
use farmcache_providers::remote::RedisStore;

use crate::settings::SettingsStore;

/// Identifier of the current host, used for derived key prefixes and
/// instance identities
pub fn host_identifier() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

/// Shared context for the cache and output-cache orchestrators
///
/// Key prefixes and the host identity are computed once here and stay
/// stable for the engine's lifetime; silent mode and compression are
/// read fresh from the settings snapshot on every operation.
pub struct CacheEngine {
    settings: Arc<SettingsStore>,
    remote: Arc<dyn RemoteStore>,
    host: String,
    process_id: u32,
    cache_prefix: KeyPrefix,
    output_prefix: KeyPrefix,
}

impl CacheEngine {
    /// Create an engine over an existing remote store
    pub fn new(settings: Arc<SettingsStore>, remote: Arc<dyn RemoteStore>) -> Arc<Self> {
        Self::with_identity(settings, remote, host_identifier(), std::process::id())
    }

    /// Create an engine with an explicit host identity
    ///
    /// Useful when several logical instances share one process (tests,
    /// embedded multi-tenant hosts); [`CacheEngine::new`] uses the real
    /// hostname and process id.
    pub fn with_identity(
        settings: Arc<SettingsStore>,
        remote: Arc<dyn RemoteStore>,
        host: impl Into<String>,
        process_id: u32,
    ) -> Arc<Self> {
        let host = host.into();
        let snapshot = settings.snapshot();
        let cache_prefix = KeyPrefix::cache(&snapshot.key_prefix, &host);
        let output_prefix = KeyPrefix::output(&snapshot.key_prefix, &host);
        Arc::new(Self {
            settings,
            remote,
            host,
            process_id,
            cache_prefix,
            output_prefix,
        })
    }

    /// Create an engine connected to Redis via the settings' connection
    /// string
    ///
    /// A missing or empty connection string is a fatal configuration
    /// error, regardless of silent mode.
    pub fn connect(settings: Arc<SettingsStore>) -> Result<Arc<Self>> {
        let connection_string = settings.snapshot().connection_string.clone();
        let remote = Arc::new(RedisStore::new(&connection_string)?);
        Ok(Self::new(settings, remote))
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Arc<CacheSettings> {
        self.settings.snapshot()
    }

    /// The settings store
    pub fn settings_store(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// The shared remote store handle
    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    /// Key prefix of the object-cache keyspace
    pub fn cache_prefix(&self) -> &KeyPrefix {
        &self.cache_prefix
    }

    /// Key prefix of the output-cache keyspace
    pub fn output_prefix(&self) -> &KeyPrefix {
        &self.output_prefix
    }

    /// Codec derived from the current settings snapshot
    pub fn codec(&self) -> ValueCodec {
        ValueCodec::new(self.settings.snapshot().use_compression)
    }

    /// Identity token for an orchestrator using the given prefix
    pub(crate) fn instance_id(&self, prefix: &KeyPrefix) -> InstanceId {
        InstanceId::from_parts(prefix, &self.host, self.process_id)
    }
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("host", &self.host)
            .field("cache_prefix", &self.cache_prefix.as_str())
            .field("store", &self.remote.store_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmcache_providers::remote::MemoryStore;

    #[test]
    fn prefixes_are_fixed_at_construction() {
        let settings = SettingsStore::new(CacheSettings {
            key_prefix: "farm1".to_string(),
            ..Default::default()
        });
        let engine = CacheEngine::with_identity(settings.clone(), MemoryStore::shared(), "web01", 1);
        assert_eq!(engine.cache_prefix().as_str(), "farm1_");
        assert_eq!(engine.output_prefix().as_str(), "farm1_Output_");

        // A later settings change does not move the keyspace
        settings
            .update(CacheSettings {
                key_prefix: "other".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(engine.cache_prefix().as_str(), "farm1_");
    }

    #[test]
    fn empty_prefix_derives_from_host() {
        let settings = SettingsStore::new(CacheSettings::default());
        let engine = CacheEngine::with_identity(settings, MemoryStore::shared(), "web01", 1);
        assert_eq!(engine.cache_prefix().as_str(), "web01_");
    }

    #[test]
    fn connect_requires_a_connection_string() {
        let settings = SettingsStore::new(CacheSettings::default());
        let err = CacheEngine::connect(settings).unwrap_err();
        assert!(err.is_configuration());
    }
}
