//! Settings store and service
//!
//! Settings merge defaults ← TOML file ← `FARMCACHE_*` environment, are
//! persisted back as TOML, and are held in a hot-swappable snapshot so
//! silent mode and compression can be read fresh on every operation.
//! Updating the settings triggers a full local+remote purge on both
//! orchestrators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::info;

use farmcache_domain::error::{Error, Result};
use farmcache_domain::ports::{CachingCapability, OutputCachingCapability};
use farmcache_domain::settings::CacheSettings;

use crate::orchestrator::CacheOrchestrator;
use crate::output::OutputCacheOrchestrator;

/// Environment variable prefix for settings overrides
const SETTINGS_ENV_PREFIX: &str = "FARMCACHE_";

/// Default settings file name, looked up in the working directory
const DEFAULT_SETTINGS_FILENAME: &str = "farmcache.toml";

/// Hot-swappable settings snapshot with optional file persistence
pub struct SettingsStore {
    current: ArcSwap<CacheSettings>,
    config_path: Option<PathBuf>,
}

impl SettingsStore {
    /// Create an in-memory store (no persistence), mainly for tests and
    /// embedded use
    pub fn new(settings: CacheSettings) -> Arc<Self> {
        Arc::new(Self {
            current: ArcSwap::from_pointee(settings),
            config_path: None,
        })
    }

    /// Load from the default file location and the environment
    pub fn load() -> Result<Arc<Self>> {
        Self::load_from(DEFAULT_SETTINGS_FILENAME)
    }

    /// Load from a specific TOML file and the environment
    ///
    /// Sources merge in order (later overrides earlier): defaults, the
    /// TOML file if it exists, `FARMCACHE_*` environment variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Serialized::defaults(CacheSettings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX));

        let settings: CacheSettings = figment.extract().map_err(|e| Error::Configuration {
            message: format!("Failed to load settings: {}", e),
            source: Some(Box::new(e)),
        })?;
        settings.validate()?;

        if path.exists() {
            info!("Settings loaded from {}", path.display());
        }

        Ok(Arc::new(Self {
            current: ArcSwap::from_pointee(settings),
            config_path: Some(path.to_path_buf()),
        }))
    }

    /// The current settings snapshot
    pub fn snapshot(&self) -> Arc<CacheSettings> {
        self.current.load_full()
    }

    /// The file updates are persisted to, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Validate, persist, and swap in new settings
    pub fn update(&self, settings: CacheSettings) -> Result<()> {
        settings.validate()?;

        if let Some(path) = &self.config_path {
            let toml = toml::to_string_pretty(&settings).map_err(|e| Error::Configuration {
                message: format!("Failed to serialize settings: {}", e),
                source: Some(Box::new(e)),
            })?;
            std::fs::write(path, toml).map_err(|e| Error::Configuration {
                message: format!("Failed to write settings to {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })?;
        }

        self.current.store(Arc::new(settings));
        Ok(())
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("config_path", &self.config_path)
            .finish()
    }
}

/// Settings surface for administrative callers
///
/// The contract behind the admin UI boundary: read the current settings,
/// or persist new ones and purge both caches farm-wide so every instance
/// re-reads from a clean store.
pub struct SettingsService {
    store: Arc<SettingsStore>,
    cache: CacheOrchestrator,
    output: OutputCacheOrchestrator,
}

impl SettingsService {
    /// Create the service over the store and both orchestrators
    pub fn new(
        store: Arc<SettingsStore>,
        cache: CacheOrchestrator,
        output: OutputCacheOrchestrator,
    ) -> Self {
        Self {
            store,
            cache,
            output,
        }
    }

    /// The current settings
    pub fn get_settings(&self) -> CacheSettings {
        (*self.store.snapshot()).clone()
    }

    /// Persist new settings, then purge both caches
    pub async fn update_settings(&self, settings: CacheSettings) -> Result<()> {
        self.store.update(settings)?;
        info!("Settings updated; purging caches");
        self.cache.clear("Prefix", "").await?;
        self.output.purge(-1).await?;
        Ok(())
    }
}
