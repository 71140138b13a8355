//! Structured logging with tracing
//!
//! Centralized logging initialization for hosts embedding the engine.
//! The `FARMCACHE_LOG` environment variable overrides the configured
//! level with a full `EnvFilter` directive set.

use tracing_subscriber::EnvFilter;

use farmcache_domain::error::{Error, Result};

/// Initialize the global tracing subscriber
pub fn init_logging(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_env("FARMCACHE_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Configuration {
            message: format!("Failed to initialize logging: {}", e),
            source: Some(e),
        })
}
