//! Whole-node fetches and existence checks

use crate::error::{GraphError, Result};
use crate::pagination::SnapshotPages;
use serde_json::{Map, Value};
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{args, Endpoint, ProtocolClient, Response};
use tracing::debug;

/// Endpoint serving nodes of `kind`; origins are addressed by URL instead
pub(crate) fn endpoint_for(kind: ObjectKind) -> Option<Endpoint> {
    match kind {
        ObjectKind::Snapshot => Some(Endpoint::Snapshot),
        ObjectKind::Revision => Some(Endpoint::Revision),
        ObjectKind::Release => Some(Endpoint::Release),
        ObjectKind::Directory => Some(Endpoint::Directory),
        ObjectKind::Content => Some(Endpoint::Content),
        ObjectKind::Origin => None,
    }
}

/// Snapshot with every branch page merged
///
/// Branches are merged first-seen-wins in page order; `next_branch` of the
/// merged body is null. Headers are those of the first page.
pub fn full_snapshot(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    let id = id.expect_kind(ObjectKind::Snapshot)?;

    let mut first: Option<Response> = None;
    let mut merged = Map::new();
    let mut pages = 0usize;

    for page in SnapshotPages::new(client, id) {
        let page = page?;
        pages += 1;
        for (name, value) in page.raw_branches() {
            if !merged.contains_key(name) {
                merged.insert(name.clone(), value.clone());
            }
        }
        if first.is_none() {
            first = Some(page.into_response());
        }
    }

    debug!(target: "swh::graph", snapshot = %id, pages, branches = merged.len(), "Merged snapshot pages");

    let first = first.ok_or(GraphError::MissingField {
        endpoint: "snapshot",
        field: "branches",
    })?;
    let mut body = match first.body() {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    body.insert("branches".to_string(), Value::Object(merged));
    body.insert("next_branch".to_string(), Value::Null);
    Ok(first.with_body(Value::Object(body)))
}

/// Release metadata
pub fn full_release(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    fetch_as(client, id, ObjectKind::Release)
}

/// Revision metadata
pub fn full_revision(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    fetch_as(client, id, ObjectKind::Revision)
}

/// Directory listing
pub fn full_directory(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    fetch_as(client, id, ObjectKind::Directory)
}

/// Content metadata
pub fn full_content(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    fetch_as(client, id, ObjectKind::Content)
}

/// Whole node of any hash-addressed kind
pub fn full_node(client: &ProtocolClient, id: &Swhid) -> Result<Response> {
    match id.kind() {
        ObjectKind::Snapshot => full_snapshot(client, id),
        kind => fetch_as(client, id, kind),
    }
}

fn fetch_as(client: &ProtocolClient, id: &Swhid, kind: ObjectKind) -> Result<Response> {
    let id = id.expect_kind(kind)?;
    let endpoint = endpoint_for(kind).ok_or(GraphError::unsupported(kind, "fetch"))?;
    Ok(client.get(endpoint, &args![id.hex()])?)
}

/// HEAD the node: `Ok(false)` when the archive answers 404
pub fn node_exists(client: &ProtocolClient, id: &Swhid) -> Result<bool> {
    let endpoint = endpoint_for(id.kind()).ok_or(GraphError::unsupported(id.kind(), "exists"))?;
    Ok(client.exists(endpoint, &args![id.hex()])?)
}

/// Origin metadata
pub fn full_origin(client: &ProtocolClient, url: &str) -> Result<Response> {
    Ok(client.get(Endpoint::Origin, &args![url.trim()])?)
}

/// HEAD the origin
pub fn origin_exists(client: &ProtocolClient, url: &str) -> Result<bool> {
    Ok(client.exists(Endpoint::Origin, &args![url.trim()])?)
}

/// Origin identifier, read from the origin's metadata-authorities link
///
/// The archive does not return the origin hash directly; it appears as a
/// path segment of `metadata_authorities_url`.
pub fn origin_swhid(client: &ProtocolClient, url: &str) -> Result<Swhid> {
    let response = full_origin(client, url)?;
    let link = response
        .body()
        .get("metadata_authorities_url")
        .and_then(Value::as_str)
        .ok_or(GraphError::MissingField {
            endpoint: "origin",
            field: "metadata_authorities_url",
        })?;

    let segment = link
        .split('/')
        .find(|s| s.starts_with("swh:1:ori:"))
        .ok_or(GraphError::MissingField {
            endpoint: "origin",
            field: "metadata_authorities_url",
        })?;
    Ok(Swhid::parse(segment)?.expect_kind(ObjectKind::Origin)?)
}
