//! Snapshot branch pagination
//!
//! The archive returns at most one page of branches per call, plus a
//! `next_branch` cursor naming the first branch of the next page. The
//! cursor is sent back as `branches_from`. [`SnapshotPages`] walks the
//! pages lazily so callers can stop as soon as they find what they want,
//! and refuses to go past the client's page bound.

use crate::error::{GraphError, Result};
use serde_json::{Map, Value};
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{args, Endpoint, ProtocolClient, ProtocolError, Response};
use tracing::debug;

/// One branch entry as listed by the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name, e.g. `refs/heads/main` or `HEAD`
    pub name: String,
    /// Target hash, or the aliased branch name for aliases
    pub target: Option<String>,
    /// `revision`, `release`, `alias`, ...
    pub target_type: Option<String>,
}

impl Branch {
    fn from_entry(name: &str, entry: &Value) -> Self {
        let field = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
        Branch {
            name: name.to_string(),
            target: field("target"),
            target_type: field("target_type"),
        }
    }

    /// Target as an identifier; `None` for aliases and malformed entries
    pub fn swhid(&self) -> Option<Swhid> {
        let kind = ObjectKind::from_type_name(self.target_type.as_deref()?).ok()?;
        Swhid::new(kind, self.target.as_deref()?).ok()
    }

    /// True for the `HEAD` alias and other `HEAD`-named entries
    pub fn is_head(&self) -> bool {
        self.name.contains("HEAD")
    }

    /// True if the branch can anchor a traversal
    pub fn is_anchor(&self) -> bool {
        matches!(
            self.swhid().map(|id| id.kind()),
            Some(ObjectKind::Revision) | Some(ObjectKind::Release)
        )
    }
}

/// One page of a snapshot listing
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    /// Branches in the order the archive listed them
    pub branches: Vec<Branch>,
    /// Cursor for the next page
    pub next_branch: Option<String>,
    response: Response,
}

impl SnapshotPage {
    fn parse(response: Response) -> Result<Self> {
        let listing = response
            .body()
            .get("branches")
            .and_then(Value::as_object)
            .ok_or(GraphError::MissingField {
                endpoint: "snapshot",
                field: "branches",
            })?;

        let branches = listing
            .iter()
            .map(|(name, entry)| Branch::from_entry(name, entry))
            .collect();
        let next_branch = response
            .body()
            .get("next_branch")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(SnapshotPage {
            branches,
            next_branch,
            response,
        })
    }

    /// The branch listing exactly as received
    pub fn raw_branches(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.response
            .body()
            .get("branches")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter())
    }

    /// The underlying response
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Take the underlying response
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    From(String),
    Done,
}

/// Lazy walk over a snapshot's branch pages
///
/// Yields `Err(PageLimit)` once, instead of fetching a page past the
/// client's bound, and stops after any error.
pub struct SnapshotPages<'c> {
    client: &'c ProtocolClient,
    snapshot: Swhid,
    cursor: Cursor,
    fetched: usize,
}

impl<'c> SnapshotPages<'c> {
    /// Start at the first page
    pub fn new(client: &'c ProtocolClient, snapshot: Swhid) -> Self {
        SnapshotPages {
            client,
            snapshot,
            cursor: Cursor::Start,
            fetched: 0,
        }
    }

    /// Pages fetched so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    fn fetch(&self, from: Option<&str>) -> Result<SnapshotPage> {
        let arg = match from {
            None => self.snapshot.hex().to_string(),
            Some(branch) => format!(
                "{}/?branches_from={}",
                self.snapshot.hex(),
                url::form_urlencoded::byte_serialize(branch.as_bytes()).collect::<String>()
            ),
        };
        let response = self.client.get(Endpoint::Snapshot, &args![arg])?;
        SnapshotPage::parse(response)
    }
}

impl Iterator for SnapshotPages<'_> {
    type Item = Result<SnapshotPage>;

    fn next(&mut self) -> Option<Self::Item> {
        let from = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::From(branch) => Some(branch),
        };

        let max = self.client.max_pages();
        if self.fetched >= max {
            return Some(Err(ProtocolError::PageLimit { max }.into()));
        }
        self.fetched += 1;

        let page = self.fetch(from.as_deref());
        if let Ok(page) = &page {
            debug!(
                target: "swh::graph",
                snapshot = %self.snapshot,
                page = self.fetched,
                branches = page.branches.len(),
                next_branch = ?page.next_branch,
                "Fetched snapshot page"
            );
            if let Some(next) = &page.next_branch {
                self.cursor = Cursor::From(next.clone());
            }
        }
        Some(page)
    }
}
