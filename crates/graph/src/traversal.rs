//! Path traversal from a snapshot, release, revision or directory
//!
//! A traversal runs as an explicit state machine:
//!
//! ```text
//! ResolveBranch -> ResolveRevisionFromRelease* -> ResolveRootDirectory -> ResolvePath -> Done
//! ```
//!
//! Starting points other than a snapshot enter part way along. When no
//! branch matches, the front segment of the path queue moves to the back of
//! the branch queue and branch resolution restarts, so a branch named
//! `feature/login` is found from the request `feature` + `login/src`.
//!
//! A traversal that ends on something absent from the archive returns
//! [`TraversalOutcome::NotFound`]; errors are reserved for failed requests
//! and malformed input.

use crate::branch::BranchMatcher;
use crate::edges::{entry_kind, release_target, revision_edges};
use crate::error::{GraphError, Result};
use crate::pagination::SnapshotPages;
use crate::revlog::find_commit;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::VecDeque;
use swhdag_core::{build_contexts, Contexts, ObjectKind, ResolvedIds, Swhid};
use swhdag_protocol::{args, Endpoint, ProtocolClient};
use tracing::{debug, info, warn};
use url::Url;

/// Branch and path segments still to resolve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalRequest {
    /// Segments naming the branch, joined with `/`
    pub branch_queue: VecDeque<String>,
    /// Segments of the path inside the root directory
    pub path_queue: VecDeque<String>,
}

impl TraversalRequest {
    /// Empty request: default branch, root directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Request from `/`-separated branch and path text
    ///
    /// Empty segments are dropped, so `"/src//lib/"` is `["src", "lib"]`.
    pub fn parse(branch: &str, path: &str) -> Self {
        TraversalRequest {
            branch_queue: segments(branch).collect(),
            path_queue: segments(path).collect(),
        }
    }

    /// Request for the default branch and `path`
    pub fn path(path: &str) -> Self {
        Self::parse("", path)
    }

    /// Builder form: set the branch
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch_queue = segments(branch).collect();
        self
    }

    /// Builder form: set the path
    pub fn with_path(mut self, path: &str) -> Self {
        self.path_queue = segments(path).collect();
        self
    }

    /// Move the front path segment to the back of the branch queue
    fn amend_branch(&mut self) -> bool {
        match self.path_queue.pop_front() {
            Some(segment) => {
                self.branch_queue.push_back(segment);
                true
            }
            None => false,
        }
    }
}

fn segments(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// What a traversal could not find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No branch matched
    Branch,
    /// A requested commit hash is not in any branch's logged history
    Commit,
    /// The path does not exist under the root directory
    Path,
}

/// A successful traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Snapshot the traversal started from
    pub snapshot: Option<Swhid>,
    /// First release dereferenced, if any
    pub release: Option<Swhid>,
    /// Anchoring revision
    pub revision: Option<Swhid>,
    /// Root directory the path was resolved in
    pub root_directory: Option<Swhid>,
    /// The node the traversal ended on
    pub target: Swhid,
    /// Path segments resolved inside the root directory
    pub path: Vec<String>,
}

impl ResolvedPath {
    /// Identifiers along the traversal
    ///
    /// The directory slot holds the target when it is a directory and the
    /// root directory otherwise. A revision reached through a path is a
    /// submodule, not the anchor.
    pub fn ids(&self) -> ResolvedIds {
        let mut ids = ResolvedIds {
            snapshot: self.snapshot,
            release: self.release,
            revision: self.revision,
            directory: self.root_directory,
            ..ResolvedIds::default()
        };
        match self.target.kind() {
            ObjectKind::Revision if self.root_directory.is_some() => {
                ids.submodule = Some(self.target)
            }
            _ => ids.insert(self.target),
        }
        ids
    }

    /// Contextual identifiers for the target
    pub fn contexts(&self, origin_url: &str) -> Contexts {
        build_contexts(&self.ids(), origin_url, Some(&self.path))
    }
}

/// Result of a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalOutcome {
    /// Resolved to a node
    Resolved(ResolvedPath),
    /// Something along the way does not exist
    NotFound(Missing),
}

impl TraversalOutcome {
    /// The resolved path, if any
    pub fn resolved(&self) -> Option<&ResolvedPath> {
        match self {
            TraversalOutcome::Resolved(path) => Some(path),
            TraversalOutcome::NotFound(_) => None,
        }
    }

    /// The final node, if any
    pub fn target(&self) -> Option<Swhid> {
        self.resolved().map(|p| p.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ResolveBranch(Swhid),
    ResolveRevisionFromRelease(Swhid),
    ResolveRootDirectory(Swhid),
    ResolvePath(Swhid),
    Done(Swhid),
}

enum BranchStep {
    Found(Swhid),
    Amended,
    Missing(Missing),
}

#[derive(Debug, Default)]
struct Trail {
    snapshot: Option<Swhid>,
    release: Option<Swhid>,
    revision: Option<Swhid>,
    root_directory: Option<Swhid>,
}

/// Resolve `request` starting from any node with out-edges
///
/// Snapshots start at branch resolution, releases at dereferencing,
/// revisions at their root directory and directories at path resolution.
pub fn traverse(
    client: &ProtocolClient,
    start: &Swhid,
    request: TraversalRequest,
) -> Result<TraversalOutcome> {
    info!(
        target: "swh::traversal",
        start = %start,
        branch = ?request.branch_queue,
        path = ?request.path_queue,
        "Starting traversal"
    );
    let mut walk = Walk {
        client,
        request,
        trail: Trail::default(),
    };
    let state = match start.kind() {
        ObjectKind::Snapshot => {
            walk.trail.snapshot = Some(*start);
            State::ResolveBranch(*start)
        }
        _ => walk.enter(*start, "traverse")?,
    };
    walk.run(state)
}

/// Resolve a path from a snapshot
pub fn traverse_from_snapshot(
    client: &ProtocolClient,
    snapshot: &Swhid,
    request: TraversalRequest,
) -> Result<TraversalOutcome> {
    traverse(client, &snapshot.expect_kind(ObjectKind::Snapshot)?, request)
}

/// Resolve a path from a directory
pub fn traverse_from_directory(
    client: &ProtocolClient,
    directory: &Swhid,
    path: &str,
) -> Result<TraversalOutcome> {
    traverse(
        client,
        &directory.expect_kind(ObjectKind::Directory)?,
        TraversalRequest::path(path),
    )
}

/// Follow a release chain to its first non-release target
///
/// There is no cycle detection; each hop is logged.
pub fn dereference_release(client: &ProtocolClient, release: &Swhid) -> Result<Swhid> {
    let mut current = release.expect_kind(ObjectKind::Release)?;
    loop {
        let target = release_target(client, &current)?;
        debug!(target: "swh::traversal", release = %current, target = %target, "Dereferenced release");
        if target.kind() != ObjectKind::Release {
            return Ok(target);
        }
        current = target;
    }
}

/// Resolve `path` inside a revision with a single `revisionPath` call
///
/// Files resolve to their content, directories to themselves. An empty
/// path resolves to the root directory.
pub fn traverse_from_revision(
    client: &ProtocolClient,
    revision: &Swhid,
    path: &str,
) -> Result<TraversalOutcome> {
    let revision = revision.expect_kind(ObjectKind::Revision)?;
    let segments: Vec<String> = segments(path).collect();
    if segments.is_empty() {
        let root = revision_edges(client, &revision)?
            .directory
            .ok_or(GraphError::MissingField {
                endpoint: "revision",
                field: "directory",
            })?;
        return Ok(TraversalOutcome::Resolved(ResolvedPath {
            snapshot: None,
            release: None,
            revision: Some(revision),
            root_directory: Some(root),
            target: root,
            path: segments,
        }));
    }

    let response = match client.get(
        Endpoint::RevisionPath,
        &args![revision.hex(), encode_path(&segments)],
    ) {
        Ok(response) => response,
        Err(e) if e.is_not_found() => return Ok(TraversalOutcome::NotFound(Missing::Path)),
        Err(e) => return Err(e.into()),
    };

    let body = response.body();
    let missing = |field| GraphError::MissingField {
        endpoint: "revisionPath",
        field,
    };
    let target = match body.get("type").and_then(Value::as_str) {
        Some("file") => {
            let hex = body
                .pointer("/content/checksums/sha1_git")
                .and_then(Value::as_str)
                .ok_or(missing("content.checksums.sha1_git"))?;
            Swhid::new(ObjectKind::Content, hex)?
        }
        Some("dir") => {
            let hex = body
                .get("content")
                .and_then(Value::as_array)
                .and_then(|entries| {
                    entries
                        .iter()
                        .find_map(|e| e.get("dir_id").and_then(Value::as_str))
                })
                .ok_or(missing("content.dir_id"))?;
            Swhid::new(ObjectKind::Directory, hex)?
        }
        _ => return Err(missing("type")),
    };

    Ok(TraversalOutcome::Resolved(ResolvedPath {
        snapshot: None,
        release: None,
        revision: Some(revision),
        root_directory: None,
        target,
        path: segments,
    }))
}

/// Percent-encode each segment and join with `/`
pub(crate) fn encode_path(segments: &[String]) -> String {
    static BASE: Lazy<Option<Url>> = Lazy::new(|| Url::parse("http://localhost/").ok());

    let Some(mut url) = BASE.clone() else {
        return segments.join("/");
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().trim_start_matches('/').to_string()
}

struct Walk<'c> {
    client: &'c ProtocolClient,
    request: TraversalRequest,
    trail: Trail,
}

impl Walk<'_> {
    fn run(&mut self, mut state: State) -> Result<TraversalOutcome> {
        loop {
            debug!(target: "swh::traversal", state = ?state, "Traversal step");
            state = match state {
                State::ResolveBranch(snapshot) => match self.resolve_branch(snapshot)? {
                    BranchStep::Found(target) => self.enter(target, "traverse")?,
                    BranchStep::Amended => State::ResolveBranch(snapshot),
                    BranchStep::Missing(missing) => {
                        info!(target: "swh::traversal", missing = ?missing, "Traversal found nothing");
                        return Ok(TraversalOutcome::NotFound(missing));
                    }
                },
                State::ResolveRevisionFromRelease(release) => {
                    let target = release_target(self.client, &release)?;
                    debug!(target: "swh::traversal", release = %release, target = %target, "Dereferenced release");
                    self.enter(target, "traverse")?
                }
                State::ResolveRootDirectory(revision) => {
                    let directory = revision_edges(self.client, &revision)?.directory.ok_or(
                        GraphError::MissingField {
                            endpoint: "revision",
                            field: "directory",
                        },
                    )?;
                    self.enter(directory, "traverse")?
                }
                State::ResolvePath(directory) => match self.resolve_path(directory)? {
                    Some(target) => State::Done(target),
                    None => return Ok(TraversalOutcome::NotFound(Missing::Path)),
                },
                State::Done(target) => {
                    info!(target: "swh::traversal", target = %target, "Traversal resolved");
                    return Ok(TraversalOutcome::Resolved(ResolvedPath {
                        snapshot: self.trail.snapshot,
                        release: self.trail.release,
                        revision: self.trail.revision,
                        root_directory: self.trail.root_directory,
                        target,
                        path: self.request.path_queue.iter().cloned().collect(),
                    }));
                }
            };
        }
    }

    /// State for arriving at `id`
    fn enter(&mut self, id: Swhid, operation: &'static str) -> Result<State> {
        match id.kind() {
            ObjectKind::Release => {
                self.trail.release.get_or_insert(id);
                Ok(State::ResolveRevisionFromRelease(id))
            }
            ObjectKind::Revision => {
                self.trail.revision = Some(id);
                Ok(State::ResolveRootDirectory(id))
            }
            ObjectKind::Directory => {
                self.trail.root_directory = Some(id);
                Ok(State::ResolvePath(id))
            }
            kind => Err(GraphError::unsupported(kind, operation)),
        }
    }

    fn resolve_branch(&mut self, snapshot: Swhid) -> Result<BranchStep> {
        let mut matcher = BranchMatcher::from_queue(&self.request.branch_queue)?;
        let mut tips: Vec<Swhid> = Vec::new();

        for page in SnapshotPages::new(self.client, snapshot) {
            let page = page?;
            matcher.observe_head(&page.branches)?;

            if let Some(hit) = matcher.find(&page.branches) {
                info!(
                    target: "swh::traversal",
                    branch = %hit.name,
                    target = %hit.target,
                    rank = ?hit.rank,
                    "Matched branch"
                );
                return Ok(BranchStep::Found(hit.target));
            }

            for branch in page.branches.iter().filter(|b| !b.is_head()) {
                if let Some(id) = branch.swhid().filter(|id| id.kind() == ObjectKind::Revision) {
                    if !tips.contains(&id) {
                        tips.push(id);
                    }
                }
            }
        }

        if let Some(commit) = matcher.commit_hash() {
            info!(
                target: "swh::traversal",
                commit,
                tips = tips.len(),
                "No branch points at commit, searching history"
            );
            return Ok(match find_commit(self.client, &tips, commit)? {
                Some(revision) => BranchStep::Found(revision),
                None => BranchStep::Missing(Missing::Commit),
            });
        }

        if self.request.amend_branch() {
            info!(
                target: "swh::traversal",
                branch = ?self.request.branch_queue,
                path = ?self.request.path_queue,
                "No branch matched, extending branch name from path"
            );
            return Ok(BranchStep::Amended);
        }

        warn!(target: "swh::traversal", candidates = ?matcher.candidates(), "Branch does not exist");
        Ok(BranchStep::Missing(Missing::Branch))
    }

    fn resolve_path(&self, directory: Swhid) -> Result<Option<Swhid>> {
        if self.request.path_queue.is_empty() {
            return Ok(Some(directory));
        }
        let segments: Vec<String> = self.request.path_queue.iter().cloned().collect();
        let encoded = encode_path(&segments);

        let response = match self
            .client
            .get(Endpoint::DirectoryPath, &args![directory.hex(), encoded])
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                info!(target: "swh::traversal", directory = %directory, path = %segments.join("/"), "Path not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let body = response.body();
        if body.is_array() {
            return Ok(Some(directory));
        }

        let kind = entry_kind(body.get("type").and_then(Value::as_str)).ok_or(
            GraphError::MissingField {
                endpoint: "directoryPath",
                field: "type",
            },
        )?;
        let hex = body
            .get("target")
            .and_then(Value::as_str)
            .ok_or(GraphError::MissingField {
                endpoint: "directoryPath",
                field: "target",
            })?;
        Ok(Some(Swhid::new(kind, hex)?))
    }
}
