//! Error types for the SWHID grammar
//!
//! Grammar errors are local: they are raised before anything is sent over
//! the wire and never trigger a retry. We use `thiserror` for `Display` and
//! `Error` implementations.

use crate::swhid::ObjectKind;
use thiserror::Error;

/// Result type alias for grammar operations
pub type Result<T> = std::result::Result<T, SwhidError>;

/// Errors produced while parsing, validating or formatting a SWHID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwhidError {
    /// The text does not contain exactly three `:` separators
    #[error("malformed SWHID: expected 3 ':' separators, found {found}")]
    SeparatorCount {
        /// Number of separators found
        found: usize,
    },

    /// The object kind is not one of the known tags or type names
    #[error("unknown SWHID object kind: '{0}'")]
    UnknownKind(String),

    /// Namespace or version does not match `swh:1`
    #[error("unsupported SWHID header '{found}' (expected 'swh:1')")]
    Header {
        /// The header that was found
        found: String,
    },

    /// The hash segment is not 40 hexadecimal characters
    #[error("invalid SWHID hash '{0}': expected 40 hexadecimal characters")]
    InvalidHex(String),

    /// The identifier parsed but names a different kind than required
    #[error("kind mismatch: expected a {expected} SWHID, got a {found} SWHID")]
    KindMismatch {
        /// Kind the caller required
        expected: ObjectKind,
        /// Kind that was parsed
        found: ObjectKind,
    },
}
