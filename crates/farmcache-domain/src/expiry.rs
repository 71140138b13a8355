//! Expiry policy and TTL conversion
//!
//! An entry's expiry is always normalized to a TTL before the remote
//! write: an absolute expiry becomes `absolute - now`, a sliding request
//! becomes its duration ("now + duration" at write time). The remote
//! store never re-extends a TTL on read; sliding renewal applies to the
//! local tier only.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Sanity ceiling for mirroring a remote TTL into the local tier
///
/// A remote entry whose remaining TTL exceeds this is treated as
/// non-expiring locally, bounding local staleness for values written with
/// very long or no TTL.
pub const LOCAL_TTL_CEILING: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Requested expiry for an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpiryPolicy {
    /// Absolute expiry instant, if one was requested
    pub absolute: Option<DateTime<Utc>>,
    /// Sliding expiry duration, if one was requested
    pub sliding: Option<Duration>,
}

impl ExpiryPolicy {
    /// No expiry: the entry lives until removed
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire at an absolute instant
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self {
            absolute: Some(at),
            sliding: None,
        }
    }

    /// Expire a sliding duration after each local touch
    pub fn sliding(duration: Duration) -> Self {
        Self {
            absolute: None,
            sliding: Some(duration),
        }
    }

    /// The TTL to send with the remote write
    ///
    /// An absolute expiry wins over a sliding one; an absolute instant
    /// already in the past collapses to a zero TTL. A zero sliding
    /// duration means "no expiry", mirroring the insert contract.
    pub fn remote_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        if let Some(at) = self.absolute {
            Some((at - now).to_std().unwrap_or(Duration::ZERO))
        } else {
            self.sliding.filter(|d| !d.is_zero())
        }
    }
}

/// TTL for the local re-population after a remote fallback hit
///
/// `None` (no remote expiry) and anything at or above
/// [`LOCAL_TTL_CEILING`] map to a non-expiring local entry.
pub fn local_ttl(remaining: Option<Duration>) -> Option<Duration> {
    remaining.filter(|d| *d < LOCAL_TTL_CEILING)
}

/// Relative priority of a local-tier entry under memory pressure
///
/// Carried through to the local tier so providers that support weighted
/// eviction can honor it; providers without priority support ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePriority {
    /// Evict first
    Low,
    /// Ordinary entry
    #[default]
    Normal,
    /// Evict last
    High,
    /// Never evict for pressure (TTL still applies)
    NotRemovable,
}

/// Options for a local-tier insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalEntryOptions {
    /// Time to live; `None` means non-expiring
    pub ttl: Option<Duration>,
    /// Eviction priority
    pub priority: CachePriority,
}

impl LocalEntryOptions {
    /// Options with a TTL and normal priority
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            priority: CachePriority::Normal,
        }
    }

    /// Set the eviction priority
    pub fn priority(mut self, priority: CachePriority) -> Self {
        self.priority = priority;
        self
    }
}
