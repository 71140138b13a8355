//! Per-process instance identity
//!
//! Every invalidation message this process publishes is tagged with its
//! instance identity so the process can recognize and discard its own
//! echoes coming back over the subscription.

use crate::keys::KeyPrefix;

/// Identity token for one cache engine instance
///
/// Format: `{keyPrefix}{hostName}_{processId:08X}`. Created once per engine
/// and immutable thereafter. Two orchestrators in one process have distinct
/// identities because their key prefixes differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceId(String);

impl InstanceId {
    /// Build an identity from its parts
    pub fn from_parts(prefix: &KeyPrefix, host: &str, process_id: u32) -> Self {
        Self(format!("{}{}_{:08X}", prefix.as_str(), host, process_id))
    }

    /// The raw identity token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a message sender is this instance (echo detection)
    pub fn is_self(&self, sender: &str) -> bool {
        sender == self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
