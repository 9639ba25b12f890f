//! Error types for graph operations
//!
//! "Not found in the graph" is not an error here: lookups return `Option`
//! and traversals return [`TraversalOutcome::NotFound`]. These variants
//! cover malformed calls and failed requests.
//!
//! [`TraversalOutcome::NotFound`]: crate::traversal::TraversalOutcome::NotFound

use swhdag_core::{ObjectKind, SwhidError};
use swhdag_protocol::ProtocolError;
use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while walking the archive graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Request failed at the protocol layer
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Malformed identifier
    #[error(transparent)]
    Grammar(#[from] SwhidError),

    /// The operation makes no sense for this node kind
    #[error("'{operation}' is not supported from {kind} nodes")]
    UnsupportedTypeCombination {
        /// Kind of the node the operation started from
        kind: ObjectKind,
        /// Operation name
        operation: &'static str,
    },

    /// A response lacked a field the operation needs
    #[error("response from '{endpoint}' is missing '{field}'")]
    MissingField {
        /// Endpoint that answered
        endpoint: &'static str,
        /// Missing field
        field: &'static str,
    },

    /// A visit has no snapshot yet
    #[error("visit {visit} of {origin} has no snapshot (status: {status})")]
    SnapshotPending {
        /// Origin URL
        origin: String,
        /// Visit number
        visit: u64,
        /// Reported visit status
        status: String,
    },

    /// Input the operation cannot interpret
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphError {
    /// True for a remote 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::Protocol(e) if e.is_not_found())
    }

    pub(crate) fn unsupported(kind: ObjectKind, operation: &'static str) -> Self {
        GraphError::UnsupportedTypeCombination { kind, operation }
    }
}
