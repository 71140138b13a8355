//! # farmcache - Domain Layer
//!
//! Core types and port traits for the farmcache two-tier cache: value
//! objects (keys, identities, invalidation messages, expiry policies,
//! settings) and the contracts implemented by the provider crate.
//!
//! This crate is a pure library: no I/O, no runtime. Providers live in
//! `farmcache-providers`; the engine and orchestrators in
//! `farmcache-engine`.

pub mod error;
pub mod expiry;
pub mod identity;
pub mod keys;
pub mod messages;
pub mod ports;
pub mod settings;

// Re-export the error types at the crate root for convenience
pub use error::{Error, Result};
