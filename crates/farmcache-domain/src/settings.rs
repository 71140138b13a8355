//! Provider settings value object

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keys::validate_key_prefix;

/// Settings for the cache engine and both orchestrators
///
/// The connection string and key prefix are consumed once at engine
/// construction; `silent_mode` and `use_compression` are read fresh from
/// the current snapshot on every orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Remote store connection string; empty is a fatal configuration error
    pub connection_string: String,
    /// Whether the object-cache orchestrator is the active caching provider
    pub caching_enabled: bool,
    /// Whether the output-cache orchestrator is the active output provider
    pub output_caching_enabled: bool,
    /// Compress every encoded value crossing the remote boundary
    pub use_compression: bool,
    /// Swallow-and-log runtime faults instead of propagating them
    pub silent_mode: bool,
    /// Per-farm key prefix; empty derives one from the host identifier
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            caching_enabled: true,
            output_caching_enabled: true,
            use_compression: false,
            silent_mode: true,
            key_prefix: String::new(),
        }
    }
}

impl CacheSettings {
    /// Validate the settings for persistence
    pub fn validate(&self) -> Result<()> {
        validate_key_prefix(&self.key_prefix)
    }
}
