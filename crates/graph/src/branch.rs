//! Branch selection inside a snapshot
//!
//! A branch request is matched against the branch names of a snapshot page
//! in three ranks, strongest first:
//!
//! 1. exact: the name itself, `refs/heads/<name>`, `refs/tags/<name>`, or a
//!    branch whose target hash equals a 40-hex request
//! 2. wildcard: the glob `*/<name>`, where `*` spans `/`
//! 3. pull request: `refs/pull/<n>/head` for a numeric request
//!
//! Within a rank, earlier candidates beat later ones and, for one
//! candidate, earlier branches beat later ones. Only branches targeting a
//! revision or a release are eligible.
//!
//! With no explicit request the candidates are `main` and `master`, with
//! the branch aliased by `HEAD` appended once a page shows it.

use crate::error::{GraphError, Result};
use crate::pagination::Branch;
use regex::Regex;
use std::collections::VecDeque;
use swhdag_core::{is_sha1_hex, Swhid};

/// Branch names tried when none was requested
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

/// How a branch matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    /// Literal name, `refs/heads/`, `refs/tags/` or target hash
    Exact,
    /// `*/<name>` glob
    Wildcard,
    /// `refs/pull/<n>/head`
    PullRequest,
}

impl MatchRank {
    const ALL: [MatchRank; 3] = [MatchRank::Exact, MatchRank::Wildcard, MatchRank::PullRequest];
}

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    glob: Regex,
    pull: Option<String>,
}

impl Candidate {
    fn new(name: &str) -> Result<Self> {
        let name = name.trim().to_string();
        let pattern = format!("^{}$", regex::escape(&format!("*/{}", name)).replace(r"\*", ".*"));
        let glob = Regex::new(&pattern)
            .map_err(|e| GraphError::InvalidArgument(format!("branch '{}': {}", name, e)))?;
        let pull = (!name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            .then(|| format!("refs/pull/{}/head", name));
        Ok(Candidate { name, glob, pull })
    }

    fn matches(&self, rank: MatchRank, branch: &Branch) -> bool {
        let key = branch.name.as_str();
        match rank {
            MatchRank::Exact => {
                key == self.name
                    || key.strip_prefix("refs/heads/") == Some(self.name.as_str())
                    || key.strip_prefix("refs/tags/") == Some(self.name.as_str())
                    || (is_sha1_hex(&self.name)
                        && branch
                            .target
                            .as_deref()
                            .is_some_and(|t| t.eq_ignore_ascii_case(&self.name)))
            }
            MatchRank::Wildcard => self.glob.is_match(key),
            MatchRank::PullRequest => self.pull.as_deref() == Some(key),
        }
    }
}

/// A branch picked from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchMatch {
    /// Branch name
    pub name: String,
    /// Revision or release the branch points at
    pub target: Swhid,
    /// Rank it matched at
    pub rank: MatchRank,
}

/// Candidate list for one branch request
#[derive(Debug, Clone)]
pub struct BranchMatcher {
    candidates: Vec<Candidate>,
    defaulted: bool,
    head_seen: bool,
}

impl BranchMatcher {
    /// Candidates for a branch queue; an empty queue selects the defaults
    pub fn from_queue(queue: &VecDeque<String>) -> Result<Self> {
        if queue.is_empty() {
            return Ok(BranchMatcher {
                candidates: DEFAULT_BRANCHES
                    .iter()
                    .map(|n| Candidate::new(n))
                    .collect::<Result<_>>()?,
                defaulted: true,
                head_seen: false,
            });
        }
        let joined = queue.iter().map(String::as_str).collect::<Vec<_>>().join("/");
        Ok(BranchMatcher {
            candidates: vec![Candidate::new(&joined)?],
            defaulted: false,
            head_seen: false,
        })
    }

    /// Candidate names in priority order
    pub fn candidates(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    /// The requested 40-hex commit, if the request is one
    pub fn commit_hash(&self) -> Option<&str> {
        self.candidates
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| is_sha1_hex(name))
    }

    /// Append the `HEAD` target's basename to the defaults
    ///
    /// Only applies when no branch was requested, and only once.
    pub fn observe_head(&mut self, branches: &[Branch]) -> Result<()> {
        if !self.defaulted || self.head_seen {
            return Ok(());
        }
        let head = branches
            .iter()
            .find(|b| b.name == "HEAD")
            .and_then(|b| b.target.as_deref());
        if let Some(target) = head {
            let basename = target.rsplit('/').next().unwrap_or(target);
            if !basename.is_empty() {
                self.candidates.push(Candidate::new(basename)?);
            }
            self.head_seen = true;
        }
        Ok(())
    }

    /// Best match on one page, if any
    pub fn find(&self, branches: &[Branch]) -> Option<BranchMatch> {
        for rank in MatchRank::ALL {
            for candidate in &self.candidates {
                for branch in branches {
                    if !candidate.matches(rank, branch) {
                        continue;
                    }
                    let Some(target) = branch.swhid().filter(|_| branch.is_anchor()) else {
                        continue;
                    };
                    return Some(BranchMatch {
                        name: branch.name.clone(),
                        target,
                        rank,
                    });
                }
            }
        }
        None
    }
}
