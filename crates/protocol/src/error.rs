//! Error types for the protocol layer
//!
//! | Category | Variants | Retried |
//! |----------|----------|---------|
//! | Local | `UnknownEndpoint`, `UnsupportedMethod`, `Validation`, `Grammar`, `Config` | never |
//! | Transport | `Transport` | yes, up to the attempt bound |
//! | Remote | `RemoteStatus` | per the retry decision table |
//! | Terminal | `RedirectLimit`, `Decode`, `PageLimit` | never |

use crate::config::ConfigError;
use swhdag_core::SwhidError;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while validating, sending or decoding an API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The logical endpoint name is not in the endpoint table
    #[error("unrecognised endpoint: '{0}'")]
    UnknownEndpoint(String),

    /// HTTP verb other than GET, POST or HEAD
    #[error("unsupported HTTP method '{0}' (supported: GET, POST, HEAD)")]
    UnsupportedMethod(String),

    /// Argument count or shape does not fit the endpoint
    #[error("validation failed for endpoint '{endpoint}': {reason}")]
    Validation {
        /// Endpoint name
        endpoint: &'static str,
        /// What was wrong with the arguments
        reason: String,
    },

    /// Malformed identifier
    #[error(transparent)]
    Grammar(#[from] SwhidError),

    /// Invalid client configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection failure or timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status from the archive, after the retry policy gave up
    #[error("remote status {code}: {}", .reason.as_deref().unwrap_or("no reason given"))]
    RemoteStatus {
        /// HTTP status code
        code: u16,
        /// Reason text supplied by the archive, if any
        reason: Option<String>,
    },

    /// The server redirected more often than allowed
    #[error("exceeded redirect limit")]
    RedirectLimit,

    /// The body could not be decoded into the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A paginated fetch did not terminate within the configured page bound
    #[error("pagination exceeded {max} pages")]
    PageLimit {
        /// Configured page bound
        max: usize,
    },
}

impl ProtocolError {
    /// HTTP status carried by a `RemoteStatus` error
    pub fn status(&self) -> Option<u16> {
        match self {
            ProtocolError::RemoteStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for a remote 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for errors that never reached the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownEndpoint(_)
                | ProtocolError::UnsupportedMethod(_)
                | ProtocolError::Validation { .. }
                | ProtocolError::Grammar(_)
                | ProtocolError::Config(_)
        )
    }
}
