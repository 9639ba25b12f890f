//! Contextual identifiers
//!
//! A resolved traversal binds a node to its provenance: the origin URL, the
//! snapshot of the visit, the anchoring revision or release and, for file
//! contents, the path inside the anchor. Each context is a template whose
//! `~` placeholders are filled positionally:
//!
//! | Context | Template |
//! |---------|----------|
//! | `Directory-Context` | `DIR;origin=URL;visit=SNP;anchor=REV` |
//! | `Revision-Context` | `REV;origin=URL;visit=SNP` |
//! | `Snapshot-Context` | `SNP;origin=URL` |
//! | `Content-Context` | `CNT;origin=URL;visit=SNP;anchor=REV;path=PATH` |

use crate::swhid::{ObjectKind, Swhid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const PLACEHOLDER: char = '~';

/// The four context shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextKind {
    /// Directory bound to origin, visit and anchor
    Directory,
    /// Revision or release bound to origin and visit
    Revision,
    /// Snapshot bound to origin
    Snapshot,
    /// Content bound to origin, visit, anchor and path
    Content,
}

impl ContextKind {
    /// Display name, e.g. `Directory-Context`
    pub fn name(&self) -> &'static str {
        match self {
            ContextKind::Directory => "Directory-Context",
            ContextKind::Revision => "Revision-Context",
            ContextKind::Snapshot => "Snapshot-Context",
            ContextKind::Content => "Content-Context",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ContextKind::Directory => "~;origin=~;visit=~;anchor=~",
            ContextKind::Revision => "~;origin=~;visit=~",
            ContextKind::Snapshot => "~;origin=~",
            ContextKind::Content => "~;origin=~;visit=~;anchor=~;path=~",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifiers collected along one resolved traversal
///
/// At most one identifier per kind. `submodule` holds a revision reached
/// through a directory entry, which is kept apart from the anchoring
/// revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIds {
    /// Origin identifier, when known
    pub origin: Option<Swhid>,
    /// Snapshot the traversal started from
    pub snapshot: Option<Swhid>,
    /// Anchoring revision
    pub revision: Option<Swhid>,
    /// Anchoring release, when no revision anchors the result
    pub release: Option<Swhid>,
    /// Resolved directory
    pub directory: Option<Swhid>,
    /// Resolved file content
    pub content: Option<Swhid>,
    /// Submodule revision reached through a path
    pub submodule: Option<Swhid>,
}

impl ResolvedIds {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier in the slot for its kind, replacing any previous one
    pub fn insert(&mut self, id: Swhid) {
        let slot = match id.kind() {
            ObjectKind::Origin => &mut self.origin,
            ObjectKind::Snapshot => &mut self.snapshot,
            ObjectKind::Revision => &mut self.revision,
            ObjectKind::Release => &mut self.release,
            ObjectKind::Directory => &mut self.directory,
            ObjectKind::Content => &mut self.content,
        };
        *slot = Some(id);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, id: Swhid) -> Self {
        self.insert(id);
        self
    }

    /// The anchor: the revision if present, otherwise the release
    pub fn anchor(&self) -> Option<Swhid> {
        self.revision.or(self.release)
    }

    /// All identifiers present, in DAG order
    pub fn iter(&self) -> impl Iterator<Item = Swhid> + '_ {
        [
            self.origin,
            self.snapshot,
            self.revision,
            self.release,
            self.directory,
            self.content,
            self.submodule,
        ]
        .into_iter()
        .flatten()
    }
}

impl FromIterator<Swhid> for ResolvedIds {
    fn from_iter<I: IntoIterator<Item = Swhid>>(iter: I) -> Self {
        let mut ids = ResolvedIds::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

/// Contexts keyed by shape; `None` when a required field is missing
pub type Contexts = BTreeMap<ContextKind, Option<String>>;

/// Build every context that applies to `ids`
///
/// A content identifier selects only `Content-Context`; otherwise the three
/// ancestor contexts are produced.
pub fn build_contexts(ids: &ResolvedIds, origin_url: &str, path: Option<&[String]>) -> Contexts {
    if ids.content.is_some() {
        let joined = path.map(|segments| segments.join("/"));
        let mut contexts = Contexts::new();
        contexts.insert(
            ContextKind::Content,
            format_context(ContextKind::Content, ids, origin_url, joined.as_deref()),
        );
        return contexts;
    }

    [
        ContextKind::Directory,
        ContextKind::Revision,
        ContextKind::Snapshot,
    ]
    .into_iter()
    .map(|kind| (kind, format_context(kind, ids, origin_url, None)))
    .collect()
}

/// Fill one context template
///
/// Returns `None` if any field the template needs is missing.
pub fn format_context(
    kind: ContextKind,
    ids: &ResolvedIds,
    origin_url: &str,
    path: Option<&str>,
) -> Option<String> {
    let text = |id: Option<Swhid>| id.map(|id| id.to_string());
    let url = Some(origin_url.to_string());

    let values = match kind {
        ContextKind::Directory => vec![
            text(ids.directory),
            url,
            text(ids.snapshot),
            text(ids.anchor()),
        ],
        ContextKind::Revision => vec![text(ids.anchor()), url, text(ids.snapshot)],
        ContextKind::Snapshot => vec![text(ids.snapshot), url],
        ContextKind::Content => vec![
            text(ids.content),
            url,
            text(ids.snapshot),
            text(ids.anchor()),
            path.map(str::to_string),
        ],
    };

    fill_template(kind.template(), &values)
}

fn fill_template(template: &str, values: &[Option<String>]) -> Option<String> {
    let mut out = String::with_capacity(template.len() + values.len() * 50);
    let mut values = values.iter();
    for ch in template.chars() {
        if ch == PLACEHOLDER {
            out.push_str(values.next()?.as_deref()?);
        } else {
            out.push(ch);
        }
    }
    Some(out)
}
