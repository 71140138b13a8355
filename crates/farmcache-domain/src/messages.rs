//! Invalidation channel naming and message grammar
//!
//! Wire formats, matching the store-level contract:
//!
//! - object cache: channels `{prefix}Redis.Clear` / `{prefix}Redis.Remove`,
//!   payloads `"{sender}:{scope}:{scopeData}"` and `"{sender}_{key}"`;
//! - output cache: channels `{prefix}Redis.Output.Clear` /
//!   `{prefix}Redis.Output.Remove`, payloads `"{sender}:{siteId}"` and
//!   `"{sender}:{pageId}"`.
//!
//! Parsing is deliberately forgiving: a payload that does not match the
//! grammar is indistinguishable from a foreign, incompatible cache
//! generation sharing the store, so it yields `None` and is dropped by the
//! listener without logging.

use std::sync::OnceLock;

use regex::Regex;

use crate::identity::InstanceId;
use crate::keys::KeyPrefix;

/// Channel names for one orchestrator's invalidation traffic
#[derive(Debug, Clone)]
pub struct ChannelNames {
    clear: String,
    remove: String,
    pattern: String,
}

impl ChannelNames {
    /// Channels used by the object-cache orchestrator
    pub fn cache(prefix: &KeyPrefix) -> Self {
        Self {
            clear: format!("{}Redis.Clear", prefix.as_str()),
            remove: format!("{}Redis.Remove", prefix.as_str()),
            pattern: format!("{}Redis.*", prefix.as_str()),
        }
    }

    /// Channels used by the output-cache orchestrator
    pub fn output(prefix: &KeyPrefix) -> Self {
        Self {
            clear: format!("{}Redis.Output.Clear", prefix.as_str()),
            remove: format!("{}Redis.Output.Remove", prefix.as_str()),
            pattern: format!("{}Redis.Output.*", prefix.as_str()),
        }
    }

    /// The clear channel name
    pub fn clear(&self) -> &str {
        &self.clear
    }

    /// The remove channel name
    pub fn remove(&self) -> &str {
        &self.remove
    }

    /// The subscription pattern covering both channels
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Invalidation message on the object-cache channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMessage {
    /// Drop every local entry in the given scope
    Clear {
        /// Identity of the publishing instance
        sender: String,
        /// Clear scope name
        scope: String,
        /// Scope qualifier (opaque)
        scope_data: String,
    },
    /// Drop one local entry
    Remove {
        /// Identity of the publishing instance
        sender: String,
        /// Logical key to drop
        key: String,
    },
}

/// Matches `{sender}_{key}` where the sender ends in `_{pid:08X}`
fn remove_payload_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?_[0-9A-F]{8})_(.+)$").expect("valid regex"))
}

impl CacheMessage {
    /// Parse an inbound message; `None` means malformed or foreign
    pub fn parse(names: &ChannelNames, channel: &str, payload: &str) -> Option<Self> {
        if channel == names.clear() {
            let parts: Vec<&str> = payload.split(':').collect();
            if parts.len() != 3 {
                return None;
            }
            Some(Self::Clear {
                sender: parts[0].to_string(),
                scope: parts[1].to_string(),
                scope_data: parts[2].to_string(),
            })
        } else if channel == names.remove() {
            let caps = remove_payload_re().captures(payload)?;
            Some(Self::Remove {
                sender: caps[1].to_string(),
                key: caps[2].to_string(),
            })
        } else {
            None
        }
    }

    /// Payload for a clear announcement
    pub fn clear_payload(sender: &InstanceId, scope: &str, scope_data: &str) -> String {
        format!("{}:{}:{}", sender, scope, scope_data)
    }

    /// Payload for a removal announcement
    pub fn remove_payload(sender: &InstanceId, key: &str) -> String {
        format!("{}_{}", sender, key)
    }
}

/// Invalidation message on the output-cache channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMessage {
    /// Purge a whole site's page output
    Clear {
        /// Identity of the publishing instance
        sender: String,
        /// Site whose output is purged
        site_id: i64,
    },
    /// Drop all variations of one page
    Remove {
        /// Identity of the publishing instance
        sender: String,
        /// Page whose output is dropped
        page_id: i64,
    },
}

impl OutputMessage {
    /// Parse an inbound message; `None` means malformed or foreign
    pub fn parse(names: &ChannelNames, channel: &str, payload: &str) -> Option<Self> {
        let (sender, numeric) = payload.split_once(':')?;
        if numeric.contains(':') {
            return None;
        }
        let parsed: i64 = numeric.parse().ok()?;
        if channel == names.clear() {
            Some(Self::Clear {
                sender: sender.to_string(),
                site_id: parsed,
            })
        } else if channel == names.remove() {
            Some(Self::Remove {
                sender: sender.to_string(),
                page_id: parsed,
            })
        } else {
            None
        }
    }

    /// Payload for a site purge announcement
    pub fn clear_payload(sender: &InstanceId, site_id: i64) -> String {
        format!("{}:{}", sender, site_id)
    }

    /// Payload for a page removal announcement
    pub fn remove_payload(sender: &InstanceId, page_id: i64) -> String {
        format!("{}:{}", sender, page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_names() -> ChannelNames {
        ChannelNames::cache(&KeyPrefix::cache("farm1", "h"))
    }

    fn sender() -> InstanceId {
        InstanceId::from_parts(&KeyPrefix::cache("farm1", "h"), "web01", 0xBEEF)
    }

    #[test]
    fn channel_names_follow_prefix() {
        let names = cache_names();
        assert_eq!(names.clear(), "farm1_Redis.Clear");
        assert_eq!(names.remove(), "farm1_Redis.Remove");
        assert_eq!(names.pattern(), "farm1_Redis.*");

        let out = ChannelNames::output(&KeyPrefix::output("farm1", "h"));
        assert_eq!(out.clear(), "farm1_Output_Redis.Output.Clear");
        assert_eq!(out.pattern(), "farm1_Output_Redis.Output.*");
    }

    #[test]
    fn clear_round_trip() {
        let names = cache_names();
        let payload = CacheMessage::clear_payload(&sender(), "Prefix", "");
        let parsed = CacheMessage::parse(&names, names.clear(), &payload).unwrap();
        assert_eq!(
            parsed,
            CacheMessage::Clear {
                sender: sender().as_str().to_string(),
                scope: "Prefix".to_string(),
                scope_data: String::new(),
            }
        );
    }

    #[test]
    fn remove_round_trip_with_underscored_key() {
        let names = cache_names();
        let payload = CacheMessage::remove_payload(&sender(), "user_profile_42");
        let parsed = CacheMessage::parse(&names, names.remove(), &payload).unwrap();
        assert_eq!(
            parsed,
            CacheMessage::Remove {
                sender: sender().as_str().to_string(),
                key: "user_profile_42".to_string(),
            }
        );
    }

    #[test]
    fn malformed_payloads_yield_none() {
        let names = cache_names();
        // wrong field count for a clear
        assert!(CacheMessage::parse(&names, names.clear(), "one:two").is_none());
        assert!(CacheMessage::parse(&names, names.clear(), "a:b:c:d").is_none());
        // remove without the sender shape
        assert!(CacheMessage::parse(&names, names.remove(), "garbage").is_none());
        // unknown channel
        assert!(CacheMessage::parse(&names, "farm1_Redis.Other", "x:y:z").is_none());
    }

    #[test]
    fn output_messages_require_numeric_portion() {
        let prefix = KeyPrefix::output("farm1", "h");
        let names = ChannelNames::output(&prefix);
        let id = InstanceId::from_parts(&prefix, "web01", 3);

        let payload = OutputMessage::remove_payload(&id, 77);
        assert_eq!(
            OutputMessage::parse(&names, names.remove(), &payload),
            Some(OutputMessage::Remove {
                sender: id.as_str().to_string(),
                page_id: 77,
            })
        );

        let bad = format!("{}:notanumber", id);
        assert!(OutputMessage::parse(&names, names.remove(), &bad).is_none());
        assert!(OutputMessage::parse(&names, names.clear(), "a:b:c").is_none());
    }
}
