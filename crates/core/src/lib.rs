//! Core types for swhdag
//!
//! This crate defines the value types shared by the protocol and graph layers:
//! - Swhid: validated, normalized content-addressed identifier
//! - ObjectKind: the six node kinds of the archive DAG
//! - ResolvedIds / build_contexts: contextual identifiers for resolved nodes
//! - SwhidError: grammar errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod swhid;

pub use context::{build_contexts, format_context, ContextKind, Contexts, ResolvedIds};
pub use error::{Result, SwhidError};
pub use swhid::{
    extract_hex, format_swhid, is_sha1_hex, strip_qualifiers, ObjectKind, Swhid, HEX_LENGTH,
    SWHID_NAMESPACE, SWHID_VERSION,
};
