//! Origin visit history
//!
//! The archive lists visits newest first. The listing is paged through a
//! `Link` header; rather than walking page by page, the next request asks
//! for every visit seen so far plus the visits left before `last_visit`,
//! so the final response holds the whole history.

use crate::error::{GraphError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{args, Endpoint, ProtocolClient, ProtocolError, Response};
use tracing::{debug, info, warn};
use url::Url;

/// State of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Loaded completely, snapshot available
    Full,
    /// Scheduled
    Created,
    /// Loaded in part
    Partial,
    /// Origin was unreachable
    NotFound,
    /// Loader failed
    Failed,
    /// Still running
    Ongoing,
    /// Any status this client does not know
    #[serde(other)]
    Unknown,
}

impl VisitStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Full => "full",
            VisitStatus::Created => "created",
            VisitStatus::Partial => "partial",
            VisitStatus::NotFound => "not_found",
            VisitStatus::Failed => "failed",
            VisitStatus::Ongoing => "ongoing",
            VisitStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One visit of an origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Origin URL
    pub origin: String,
    /// Visit number, counting from 1
    pub visit: u64,
    /// When the visit happened
    pub date: DateTime<Utc>,
    /// Visit state
    pub status: VisitStatus,
    /// Snapshot hash, once the visit produced one
    #[serde(default)]
    pub snapshot: Option<String>,
    /// Loader type, e.g. `git`
    #[serde(rename = "type", default)]
    pub visit_type: Option<String>,
}

impl Visit {
    /// Snapshot as an identifier
    pub fn snapshot_id(&self) -> Option<Swhid> {
        Swhid::new(ObjectKind::Snapshot, self.snapshot.as_deref()?).ok()
    }

    /// True for a complete visit
    pub fn is_full(&self) -> bool {
        self.status == VisitStatus::Full
    }
}

/// Which visit of an origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitRef {
    /// Visit number `n`
    Number(u64),
    /// Most recent visit, optionally only among visits with a snapshot
    Latest {
        /// Skip visits that have no snapshot
        require_snapshot: bool,
    },
}

/// Which visit to take a snapshot from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitSelector {
    /// Visit number `n`
    Number(u64),
    /// Most recent visit with a snapshot
    Latest,
    /// Oldest full visit
    First,
    /// Newest full visit
    Last,
    /// The visit made at exactly this instant
    Date(DateTime<FixedOffset>),
}

/// One visit, or `None` when the archive has no such visit
pub fn visit(client: &ProtocolClient, origin: &str, which: VisitRef) -> Result<Option<Visit>> {
    let selector = match which {
        VisitRef::Number(n) => n.to_string(),
        VisitRef::Latest {
            require_snapshot: true,
        } => "latest?require_snapshot=true".to_string(),
        VisitRef::Latest {
            require_snapshot: false,
        } => "latest".to_string(),
    };
    match client.get(Endpoint::Visit, &args![origin.trim(), selector]) {
        Ok(response) => Ok(Some(response.json()?)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// HEAD visit `n` of `origin`
pub fn visit_exists(client: &ProtocolClient, origin: &str, n: u64) -> Result<bool> {
    Ok(client.exists(Endpoint::Visit, &args![origin.trim(), n])?)
}

/// Every visit of an origin, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitHistory {
    origin: String,
    visits: Vec<Visit>,
}

impl VisitHistory {
    /// Fetch the whole visit list
    pub fn fetch(client: &ProtocolClient, origin: &str) -> Result<Self> {
        let origin = origin.trim();
        let mut response = client.get(Endpoint::Visits, &args![origin, ""])?;
        let mut requests = 1usize;
        let mut requested: Option<u64> = None;

        while let Some(link) = response.next_link() {
            let Some(per_page) = widened_page(&link, page_len(&response)) else {
                warn!(target: "swh::visits", origin, link = %link, "Continuation has no last_visit; keeping partial list");
                break;
            };
            if requested.is_some_and(|prev| per_page <= prev) {
                warn!(target: "swh::visits", origin, per_page, "Visit listing did not grow; keeping partial list");
                break;
            }
            let max = client.max_pages();
            if requests >= max {
                return Err(ProtocolError::PageLimit { max }.into());
            }

            debug!(target: "swh::visits", origin, per_page, "Requesting wider visit page");
            response = client.get(
                Endpoint::Visits,
                &args![origin, format!("?per_page={}", per_page)],
            )?;
            requests += 1;
            requested = Some(per_page);
        }

        let visits: Vec<Visit> = response.json()?;
        info!(target: "swh::visits", origin, visits = visits.len(), requests, "Fetched visit history");
        Ok(VisitHistory {
            origin: origin.to_string(),
            visits,
        })
    }

    /// Wrap an already fetched list, newest first
    pub fn from_visits(origin: &str, visits: Vec<Visit>) -> Self {
        VisitHistory {
            origin: origin.to_string(),
            visits,
        }
    }

    /// Origin URL
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// All visits, newest first
    pub fn all(&self) -> &[Visit] {
        &self.visits
    }

    /// Visits in `status`, newest first
    pub fn by_status(&self, status: VisitStatus) -> Vec<&Visit> {
        self.visits.iter().filter(|v| v.status == status).collect()
    }

    /// Full visits, newest first
    pub fn full_visits(&self) -> Vec<&Visit> {
        self.by_status(VisitStatus::Full)
    }

    /// Newest full visit
    pub fn last_full_visit(&self) -> Option<&Visit> {
        self.visits.iter().find(|v| v.is_full())
    }

    /// Oldest full visit
    pub fn first_full_visit(&self) -> Option<&Visit> {
        let mut by_date: Vec<&Visit> = self.visits.iter().collect();
        by_date.sort_by_key(|v| v.date);
        by_date.into_iter().find(|v| v.is_full())
    }

    /// One full visit per distinct snapshot, the latest for each, newest first
    pub fn distinct_full_visits(&self) -> Vec<&Visit> {
        let mut latest: BTreeMap<&str, &Visit> = BTreeMap::new();
        for visit in self.visits.iter().filter(|v| v.is_full()) {
            let Some(snapshot) = visit.snapshot.as_deref() else {
                continue;
            };
            let newer = latest
                .get(snapshot)
                .map_or(true, |seen| seen.date < visit.date);
            if newer {
                latest.insert(snapshot, visit);
            }
        }
        let mut distinct: Vec<&Visit> = latest.into_values().collect();
        distinct.sort_by(|a, b| b.date.cmp(&a.date));
        distinct
    }

    /// First visit made at `date`
    pub fn at(&self, date: DateTime<FixedOffset>) -> Option<&Visit> {
        self.visits.iter().find(|v| v.date == date)
    }

    /// Snapshots of full visits keyed by visit date
    ///
    /// A full visit whose snapshot is not a valid hash maps to `None`. With
    /// `distinct`, such visits are dropped and each snapshot is kept only
    /// under the newest date that produced it.
    pub fn snapshots_by_date(&self, distinct: bool) -> BTreeMap<DateTime<Utc>, Option<Swhid>> {
        let mut snapshots = BTreeMap::new();
        let mut seen: Vec<Swhid> = Vec::new();
        for visit in self.visits.iter().filter(|v| v.is_full()) {
            let snapshot = visit.snapshot_id();
            if distinct {
                let Some(id) = snapshot else {
                    continue;
                };
                if seen.contains(&id) {
                    continue;
                }
                seen.push(id);
            }
            snapshots.entry(visit.date).or_insert(snapshot);
        }
        snapshots
    }
}

/// Snapshot produced by the selected visit
///
/// `None` when the visit does not exist or, for `First`/`Last`, when the
/// origin has no full visit. A dated visit that is not full is looked up
/// again by number, since its snapshot may have landed since the listing.
/// A visit without a snapshot yet is [`GraphError::SnapshotPending`].
pub fn snapshot_from_visit(
    client: &ProtocolClient,
    origin: &str,
    selector: VisitSelector,
) -> Result<Option<Swhid>> {
    let chosen = match selector {
        VisitSelector::Number(n) => visit(client, origin, VisitRef::Number(n))?,
        VisitSelector::Latest => visit(
            client,
            origin,
            VisitRef::Latest {
                require_snapshot: true,
            },
        )?,
        VisitSelector::First => VisitHistory::fetch(client, origin)?
            .first_full_visit()
            .cloned(),
        VisitSelector::Last => VisitHistory::fetch(client, origin)?
            .last_full_visit()
            .cloned(),
        VisitSelector::Date(date) => {
            let history = VisitHistory::fetch(client, origin)?;
            match history.at(date) {
                Some(found) if found.is_full() => Some(found.clone()),
                Some(found) => {
                    debug!(target: "swh::visits", origin, visit = found.visit, status = %found.status, "Dated visit not full, fetching it by number");
                    visit(client, origin, VisitRef::Number(found.visit))?
                }
                None => {
                    info!(target: "swh::visits", origin, date = %date, "No visit at date");
                    None
                }
            }
        }
    };

    let Some(chosen) = chosen else {
        return Ok(None);
    };
    match chosen.snapshot_id() {
        Some(snapshot) => Ok(Some(snapshot)),
        None => Err(GraphError::SnapshotPending {
            origin: chosen.origin.clone(),
            visit: chosen.visit,
            status: chosen.status.to_string(),
        }),
    }
}

fn page_len(response: &Response) -> u64 {
    response.body().as_array().map_or(0, |a| a.len() as u64)
}

/// `per_page` asking for everything seen so far and everything still to come
fn widened_page(link: &str, seen: u64) -> Option<u64> {
    let url = Url::parse(link).ok()?;
    let last_visit = url
        .query_pairs()
        .find(|(k, _)| k == "last_visit")
        .and_then(|(_, v)| v.parse::<u64>().ok())?;
    Some(last_visit + seen)
}
