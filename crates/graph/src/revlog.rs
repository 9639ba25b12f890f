//! Revision history lookups
//!
//! The archive serves at most [`REVISION_LOG_LIMIT`] entries of history per
//! request. Commits older than that are not found.

use crate::error::{GraphError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{args, Endpoint, ProtocolClient};
use tracing::{debug, info};

/// Entries requested per history lookup
pub const REVISION_LOG_LIMIT: usize = 1000;

/// History of a revision, newest first, as raw log entries
pub fn revision_log(client: &ProtocolClient, revision: &Swhid) -> Result<Vec<Value>> {
    let revision = revision.expect_kind(ObjectKind::Revision)?;
    let query = format!("?limit={}", REVISION_LOG_LIMIT);
    let response = client.get(Endpoint::RevisionLog, &args![revision.hex(), query])?;
    match response.into_body() {
        Value::Array(entries) => Ok(entries),
        _ => Err(GraphError::MissingField {
            endpoint: "revisionLog",
            field: "entries",
        }),
    }
}

/// Revision hash to parent hashes for the logged history
pub fn map_revision_log(
    client: &ProtocolClient,
    revision: &Swhid,
) -> Result<BTreeMap<String, Vec<String>>> {
    Ok(revision_log(client, revision)?
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(Value::as_str)?;
            let parents = entry
                .get("parents")
                .and_then(Value::as_array)
                .map(|ps| {
                    ps.iter()
                        .filter_map(|p| p.get("id").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some((id.to_string(), parents))
        })
        .collect())
}

/// The commit as a revision identifier, if it is in `revision`'s history
pub fn commit_in_revision_log(
    client: &ProtocolClient,
    revision: &Swhid,
    commit: &str,
) -> Result<Option<Swhid>> {
    let target = Swhid::new(ObjectKind::Revision, commit)?;
    let history = map_revision_log(client, revision)?;
    Ok(history.contains_key(target.hex()).then_some(target))
}

/// Search the history of each tip in turn; first tip containing the commit wins
///
/// A tip the archive does not know (404) is skipped.
pub fn find_commit(client: &ProtocolClient, tips: &[Swhid], commit: &str) -> Result<Option<Swhid>> {
    let target = Swhid::new(ObjectKind::Revision, commit)?;

    for tip in tips {
        match commit_in_revision_log(client, tip, target.hex()) {
            Ok(Some(found)) => {
                info!(target: "swh::traversal", tip = %tip, commit = %found, "Found commit in history");
                return Ok(Some(found));
            }
            Ok(None) => {
                debug!(target: "swh::traversal", tip = %tip, "Commit not in logged history");
            }
            Err(e) if e.is_not_found() => {
                debug!(target: "swh::traversal", tip = %tip, "History unavailable, skipping tip");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
