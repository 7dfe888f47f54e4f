//! Error types for the RFC 2136 provider
//!
//! Every failure bubbles to the immediate caller. Nothing is logged and
//! swallowed: transport and protocol failures are always returned.

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause attached to transport and resolution errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A generic record could not be decoded into a known variant
    #[error("Parse error: {0}")]
    Parse(String),

    /// The record decoded fine but its variant cannot be applied
    #[error("Unsupported record type: {0}")]
    UnsupportedRecord(String),

    /// Signing, sending or receiving a DNS message failed
    #[error("Transport error ({context}): {source}")]
    Transport {
        /// What was being attempted
        context: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// The authoritative server answered with a non-success response code
    #[error("Update rejected for {name}: {rcode}")]
    Protocol {
        /// Domain the update targeted
        name: String,
        /// Human-readable response code name
        rcode: String,
    },

    /// A recursive lookup failed (absence of records is not an error)
    #[error("Resolution of {name} failed: {source}")]
    Resolution {
        /// Name that was looked up
        name: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an unsupported record error
    pub fn unsupported(rtype: impl Into<String>) -> Self {
        Self::UnsupportedRecord(rtype.into())
    }

    /// Create a transport error with its cause
    pub fn transport(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a protocol error from a response code name
    pub fn protocol(name: impl Into<String>, rcode: impl Into<String>) -> Self {
        Self::Protocol {
            name: name.into(),
            rcode: rcode.into(),
        }
    }

    /// Create a resolution error with its cause
    pub fn resolution(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Resolution {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
