//! Port traits implemented by the provider and engine crates

pub mod local;
pub mod orchestrator;
pub mod remote;

pub use local::LocalCacheTier;
pub use orchestrator::{CachingCapability, OutputCachingCapability};
pub use remote::{ChannelMessage, MessageStream, RemoteStore, RemoteValue};
