//! Graph layer for swhdag
//!
//! Walks the Software Heritage Merkle DAG through a [`ProtocolClient`]:
//! - edges: out-edges of snapshots, revisions, releases and directories
//! - pagination / fetch: snapshot pages and whole-node fetches
//! - branch / traversal: branch selection and path resolution
//! - revlog: commit search in revision history
//! - node: a handle bundling an identifier with its client
//! - visits: origin visit history
//!
//! [`ProtocolClient`]: swhdag_protocol::ProtocolClient

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod branch;
pub mod edges;
pub mod error;
pub mod fetch;
pub mod node;
pub mod pagination;
pub mod revlog;
pub mod traversal;
pub mod visits;

pub use branch::{BranchMatch, BranchMatcher, MatchRank, DEFAULT_BRANCHES};
pub use edges::{
    directory_edges, node_edges, release_edges, release_target, revision_edges, snapshot_edges,
    snapshot_edges_with_headers, EdgeMap, NodeEdges, RevisionEdges,
};
pub use error::{GraphError, Result};
pub use fetch::{
    full_content, full_directory, full_node, full_origin, full_release, full_revision,
    full_snapshot, node_exists, origin_exists, origin_swhid,
};
pub use node::Node;
pub use pagination::{Branch, SnapshotPage, SnapshotPages};
pub use revlog::{
    commit_in_revision_log, find_commit, map_revision_log, revision_log, REVISION_LOG_LIMIT,
};
pub use traversal::{
    dereference_release, traverse, traverse_from_directory, traverse_from_revision,
    traverse_from_snapshot, Missing, ResolvedPath, TraversalOutcome, TraversalRequest,
};
pub use visits::{
    snapshot_from_visit, visit, visit_exists, Visit, VisitHistory, VisitRef, VisitSelector,
    VisitStatus,
};
