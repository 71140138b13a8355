//! Cache key namespacing
//!
//! Every key written to the remote store carries a per-farm prefix so that
//! multiple independent farms can share one store without collision. The
//! prefix is computed once at engine construction and is stable for the
//! process lifetime.

use crate::error::{Error, Result};

/// Fixed sub-prefix carried by every output-cache key, before the
/// page-specific suffix.
pub const OUTPUT_KEY_SPACE: &str = "OUTPUT:";

/// Maximum length of a configured key prefix
pub const MAX_KEY_PREFIX_LEN: usize = 20;

/// A stable, per-farm key prefix
///
/// The cache orchestrator uses `{configured}_`; the output orchestrator
/// uses `{configured}_Output_`. When no prefix is configured, the host
/// identifier takes its place so distinct deployments stay apart by
/// default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Prefix for the object-cache keyspace: `{configured}_`
    pub fn cache(configured: &str, host_fallback: &str) -> Self {
        Self(format!("{}_", Self::stem(configured, host_fallback)))
    }

    /// Prefix for the output-cache keyspace: `{configured}_Output_`
    pub fn output(configured: &str, host_fallback: &str) -> Self {
        Self(format!("{}_Output_", Self::stem(configured, host_fallback)))
    }

    fn stem<'a>(configured: &'a str, host_fallback: &'a str) -> &'a str {
        if configured.is_empty() {
            host_fallback
        } else {
            configured
        }
    }

    /// Prefix a logical key for the remote store
    pub fn apply(&self, key: &str) -> String {
        format!("{}{}", self.0, key)
    }

    /// Pattern matching every key in this prefix's keyspace
    pub fn wildcard(&self) -> String {
        format!("{}*", self.0)
    }

    /// The raw prefix string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a configured key prefix
///
/// A non-empty prefix must be 1-20 characters of `[0-9a-zA-Z-_]`. The
/// empty string is accepted and means "derive from the host identifier".
pub fn validate_key_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Ok(());
    }
    if prefix.len() > MAX_KEY_PREFIX_LEN {
        return Err(Error::configuration(format!(
            "Key prefix too long: {} characters (max {})",
            prefix.len(),
            MAX_KEY_PREFIX_LEN
        )));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::configuration(format!(
            "Key prefix '{}' contains invalid characters (allowed: 0-9 a-z A-Z - _)",
            prefix
        )));
    }
    Ok(())
}
