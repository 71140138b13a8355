//! # farmcache - Provider Implementations
//!
//! Concrete implementations of the `farmcache-domain` ports:
//!
//! | Category | Port | Implementations |
//! |----------|------|-----------------|
//! | Codec | - | [`codec::ValueCodec`] (JSON + optional DEFLATE, base64 transport form) |
//! | Local tier | `LocalCacheTier` | Moka, Null |
//! | Remote store | `RemoteStore` | Redis, Memory |
//!
//! ## Provider Selection Guide
//!
//! - **Multi-instance farm**: `RedisStore` + `MokaCacheTier`
//! - **Single instance / tests**: `MemoryStore` + `MokaCacheTier`
//! - **Caching disabled / unit tests**: `NullCacheTier`

pub mod codec;
pub mod local;
pub mod remote;

// Re-export domain types commonly used with providers
pub use farmcache_domain::error::{Error, Result};
pub use farmcache_domain::ports::{LocalCacheTier, RemoteStore};
