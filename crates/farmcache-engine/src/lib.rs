//! # farmcache - Engine
//!
//! The hybrid two-tier cache engine for multi-instance web farms: each
//! process keeps a fast local tier but stays consistent with the farm
//! through a shared remote store and a publish/subscribe invalidation
//! bus.
//!
//! ## Data flow
//!
//! A read hits the local tier first; on a miss the remote store is
//! queried, the value decoded and mirrored back into the local tier. A
//! write goes to the local tier and the remote store; removals and
//! clears additionally publish an invalidation message so every other
//! process drops its own local copy - local-only, never re-published.
//! Inserts are not broadcast: other instances miss and refetch.
//!
//! ## Construction
//!
//! ```ignore
//! use std::sync::Arc;
//! use farmcache_engine::{CacheEngine, CacheOrchestrator, OutputCacheOrchestrator, SettingsStore};
//! use farmcache_providers::local::MokaCacheTier;
//!
//! let settings = SettingsStore::load()?;
//! let engine = CacheEngine::connect(settings)?;
//! let cache = CacheOrchestrator::new(engine.clone(), Arc::new(MokaCacheTier::new()));
//! let output = OutputCacheOrchestrator::new(engine, Arc::new(MokaCacheTier::new()));
//! ```

pub mod capture;
pub mod engine;
mod invalidation;
pub mod logging;
pub mod orchestrator;
pub mod output;
mod policy;
pub mod settings;

pub use capture::ResponseCapture;
pub use engine::{host_identifier, CacheEngine};
pub use logging::init_logging;
pub use orchestrator::CacheOrchestrator;
pub use output::OutputCacheOrchestrator;
pub use settings::{SettingsService, SettingsStore};

// Re-export the capability contracts and common domain types
pub use farmcache_domain::error::{Error, Result};
pub use farmcache_domain::expiry::{CachePriority, ExpiryPolicy};
pub use farmcache_domain::ports::{CachingCapability, OutputCachingCapability};
pub use farmcache_domain::settings::CacheSettings;
