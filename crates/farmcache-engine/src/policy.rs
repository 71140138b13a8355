//! Silent-mode error boundary
//!
//! The one place the swallow-vs-rethrow decision lives. Every public
//! orchestrator operation wraps its body in [`guard`]; silent mode is
//! evaluated per call from the caller-supplied settings snapshot, never
//! cached.

use tracing::error;

use farmcache_domain::error::Result;
use farmcache_domain::settings::CacheSettings;

/// Apply the silent-mode policy to an operation outcome
///
/// Configuration errors are operator misconfigurations and rethrow
/// regardless of the setting. Everything else is logged and absorbed
/// when silent mode is on (`Ok(None)`), rethrown when it is off.
pub(crate) fn guard<T>(
    settings: &CacheSettings,
    operation: &'static str,
    result: Result<T>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_configuration() => Err(e),
        Err(e) if settings.silent_mode => {
            error!(operation, error = %e, "Cache operation failed; continuing in silent mode");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
