//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for farmcache
///
/// The silent-mode policy in the engine distinguishes configuration errors
/// (always fatal) from everything else (swallowed when silent mode is on),
/// so every variant answers [`Error::is_configuration`].
#[derive(Error, Debug)]
pub enum Error {
    /// Operator misconfiguration (missing connection string, invalid key prefix)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A value could not be serialized for the remote store
    #[error("Value is not serializable: {message}")]
    NotSerializable {
        /// Description of the serialization failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored payload could not be decoded back into a value
    #[error("Corrupt cached data: {message}")]
    CorruptData {
        /// Description of the decode failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote store transport failure (connection, timeout, command error)
    #[error("Remote store error: {message}")]
    Transport {
        /// Description of the transport error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation the backing store cannot support (e.g. purge by entry age)
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Description of the unsupported operation
        message: String,
    },
}

impl Error {
    /// Create a configuration error from a message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error from a message
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unsupported-operation error from a message
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Whether this error is an operator misconfiguration
    ///
    /// Configuration errors are rethrown regardless of the silent-mode
    /// setting; every other variant is subject to the swallow policy.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
