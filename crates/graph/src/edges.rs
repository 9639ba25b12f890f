//! Out-edges of a single node
//!
//! Each resolver fetches one node and decodes its children into
//! identifiers. An entry whose target cannot be turned into a valid
//! identifier maps to `None`; the rest of the node is still returned. A
//! failed request fails the whole call.

use crate::error::{GraphError, Result};
use crate::fetch::{full_directory, full_release, full_revision, full_snapshot};
use serde_json::Value;
use std::collections::BTreeMap;
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{Headers, ProtocolClient};

/// Child name to child identifier
pub type EdgeMap = BTreeMap<String, Option<Swhid>>;

/// Edges of a revision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionEdges {
    /// Root directory
    pub directory: Option<Swhid>,
    /// Parent revisions, in order
    pub parents: Vec<Option<Swhid>>,
}

/// Edges of any node kind that has them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEdges {
    /// Branch name to target
    Snapshot(EdgeMap),
    /// Root directory and parents
    Revision(RevisionEdges),
    /// Release name to target
    Release(EdgeMap),
    /// Entry name to entry
    Directory(EdgeMap),
}

impl NodeEdges {
    /// Target of the edge called `name`
    ///
    /// Revisions answer to `directory` and to the hash of any parent.
    pub fn target(&self, name: &str) -> Option<Swhid> {
        match self {
            NodeEdges::Snapshot(map) | NodeEdges::Release(map) | NodeEdges::Directory(map) => {
                map.get(name).copied().flatten()
            }
            NodeEdges::Revision(edges) if name == "directory" => edges.directory,
            NodeEdges::Revision(edges) => edges
                .parents
                .iter()
                .flatten()
                .find(|p| p.hex().eq_ignore_ascii_case(name))
                .copied(),
        }
    }

    /// Number of edges, malformed ones included
    pub fn len(&self) -> usize {
        match self {
            NodeEdges::Snapshot(map) | NodeEdges::Release(map) | NodeEdges::Directory(map) => {
                map.len()
            }
            NodeEdges::Revision(edges) => edges.parents.len() + 1,
        }
    }

    /// True if the node has no edges
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn typed(kind: Option<ObjectKind>, hex: Option<&str>) -> Option<Swhid> {
    Swhid::new(kind?, hex?).ok()
}

fn kind_of(type_name: Option<&str>) -> Option<ObjectKind> {
    ObjectKind::from_type_name(type_name?).ok()
}

/// Every branch of a snapshot, `HEAD` aliases excluded
pub fn snapshot_edges(client: &ProtocolClient, id: &Swhid) -> Result<EdgeMap> {
    snapshot_edges_with_headers(client, id).map(|(edges, _)| edges)
}

/// [`snapshot_edges`] plus the headers of the first page
pub fn snapshot_edges_with_headers(
    client: &ProtocolClient,
    id: &Swhid,
) -> Result<(EdgeMap, Headers)> {
    let response = full_snapshot(client, id)?;
    let edges = response
        .body()
        .get("branches")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|branches| branches.iter())
        .filter(|(name, _)| !name.contains("HEAD"))
        .map(|(name, entry)| {
            let target = typed(
                kind_of(entry.get("target_type").and_then(Value::as_str)),
                entry.get("target").and_then(Value::as_str),
            );
            (name.clone(), target)
        })
        .collect();
    Ok((edges, response.headers().clone()))
}

/// Root directory and parents of a revision
pub fn revision_edges(client: &ProtocolClient, id: &Swhid) -> Result<RevisionEdges> {
    let response = full_revision(client, id)?;
    let body = response.body();

    let directory = typed(
        Some(ObjectKind::Directory),
        body.get("directory").and_then(Value::as_str),
    );
    let parents = body
        .get("parents")
        .and_then(Value::as_array)
        .map(|parents| {
            parents
                .iter()
                .map(|p| typed(Some(ObjectKind::Revision), p.get("id").and_then(Value::as_str)))
                .collect()
        })
        .unwrap_or_default();

    Ok(RevisionEdges { directory, parents })
}

/// The release's single edge, keyed by release name
pub fn release_edges(client: &ProtocolClient, id: &Swhid) -> Result<EdgeMap> {
    let response = full_release(client, id)?;
    let body = response.body();

    let name = body
        .get("name")
        .and_then(Value::as_str)
        .ok_or(GraphError::MissingField {
            endpoint: "release",
            field: "name",
        })?;
    let target = typed(
        kind_of(body.get("target_type").and_then(Value::as_str)),
        body.get("target").and_then(Value::as_str),
    );

    Ok(BTreeMap::from([(name.to_string(), target)]))
}

/// Target of a release, which may itself be a release
pub fn release_target(client: &ProtocolClient, id: &Swhid) -> Result<Swhid> {
    let response = full_release(client, id)?;
    let body = response.body();
    let kind = kind_of(body.get("target_type").and_then(Value::as_str)).ok_or(
        GraphError::MissingField {
            endpoint: "release",
            field: "target_type",
        },
    )?;
    let hex = body
        .get("target")
        .and_then(Value::as_str)
        .ok_or(GraphError::MissingField {
            endpoint: "release",
            field: "target",
        })?;
    Ok(Swhid::new(kind, hex)?)
}

/// Entries of a directory: `dir` entries are directories, `file` entries
/// contents, `rev` entries submodule revisions
pub fn directory_edges(client: &ProtocolClient, id: &Swhid) -> Result<EdgeMap> {
    let response = full_directory(client, id)?;
    let entries = response
        .body()
        .as_array()
        .ok_or(GraphError::MissingField {
            endpoint: "directory",
            field: "entries",
        })?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name").and_then(Value::as_str)?;
            let kind = entry_kind(entry.get("type").and_then(Value::as_str));
            let target = typed(kind, entry.get("target").and_then(Value::as_str));
            Some((name.to_string(), target))
        })
        .collect())
}

/// Node kind of a directory entry type
pub(crate) fn entry_kind(entry_type: Option<&str>) -> Option<ObjectKind> {
    match entry_type? {
        "dir" => Some(ObjectKind::Directory),
        "file" => Some(ObjectKind::Content),
        "rev" => Some(ObjectKind::Revision),
        _ => None,
    }
}

/// Edges of `id`, dispatched on its kind
pub fn node_edges(client: &ProtocolClient, id: &Swhid) -> Result<NodeEdges> {
    match id.kind() {
        ObjectKind::Snapshot => snapshot_edges(client, id).map(NodeEdges::Snapshot),
        ObjectKind::Revision => revision_edges(client, id).map(NodeEdges::Revision),
        ObjectKind::Release => release_edges(client, id).map(NodeEdges::Release),
        ObjectKind::Directory => directory_edges(client, id).map(NodeEdges::Directory),
        kind @ (ObjectKind::Content | ObjectKind::Origin) => {
            Err(GraphError::unsupported(kind, "edges"))
        }
    }
}
