//! swhdag - client for the Software Heritage archive
//!
//! Resolves content-addressed identifiers (SWHIDs) against the archive's
//! HTTP API and walks its Merkle DAG: snapshots, releases, revisions,
//! directories and file contents.
//!
//! # Quick Start
//!
//! ```ignore
//! use swhdag::{ClientConfig, ProtocolClient, Swhid, TraversalRequest, traverse};
//!
//! let client = ProtocolClient::new(ClientConfig::from_env())?;
//! let snapshot = Swhid::parse("swh:1:snp:...")?;
//!
//! let outcome = traverse(&client, &snapshot, TraversalRequest::parse("main", "src/lib.rs"))?;
//! if let Some(path) = outcome.resolved() {
//!     println!("{}", path.target);
//! }
//! ```
//!
//! # Architecture
//!
//! - `swhdag-core`: identifier grammar and contextual identifiers
//! - `swhdag-protocol`: endpoint table, retrying client, HTTP transport
//! - `swhdag-graph`: edges, branch selection, traversal, visits

pub use swhdag_core::{
    build_contexts, extract_hex, format_context, format_swhid, is_sha1_hex, strip_qualifiers,
    ContextKind, Contexts, ObjectKind, ResolvedIds, Swhid, SwhidError,
};
pub use swhdag_graph::{
    commit_in_revision_log, dereference_release, directory_edges, find_commit, full_content,
    full_directory, full_node, full_origin, full_release, full_revision, full_snapshot,
    map_revision_log, node_edges, node_exists, origin_exists, origin_swhid, release_edges,
    release_target, revision_edges, revision_log, snapshot_edges, snapshot_edges_with_headers,
    snapshot_from_visit, traverse, traverse_from_directory, traverse_from_revision,
    traverse_from_snapshot, visit, visit_exists, Branch, BranchMatch, BranchMatcher, EdgeMap,
    GraphError, MatchRank, Missing, Node, NodeEdges, ResolvedPath, Result, RevisionEdges,
    SnapshotPage, SnapshotPages, TraversalOutcome, TraversalRequest, Visit, VisitHistory,
    VisitRef, VisitSelector, VisitStatus,
};
pub use swhdag_protocol::{
    args, init_logging, ApiEndpoint, ClientConfig, ConfigError, Endpoint, EndpointArg, LogConfig,
    Method, ProtocolClient, ProtocolError, Response, ResponseShape, Shaped, Transport,
};

/// Test doubles for the HTTP transport
pub mod testing {
    pub use swhdag_protocol::testing::*;
}
