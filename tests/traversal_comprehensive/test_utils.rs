//! Test utilities for traversal tests
//!
//! A canned archive keyed by route, plus builders for the JSON bodies the
//! archive returns.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use swhdag::testing::ArchiveFixture;
use swhdag::{ClientConfig, ObjectKind, ProtocolClient, Swhid};

pub const ORIGIN: &str = "https://github.com/example/repo";

pub const SNP: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const REV: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const DIR: &str = "cccccccccccccccccccccccccccccccccccccccc";
pub const SUBDIR: &str = "dddddddddddddddddddddddddddddddddddddddd";
pub const REL: &str = "eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
pub const CNT: &str = "ffffffffffffffffffffffffffffffffffffffff";
pub const OTHER_REV: &str = "0123456789abcdef0123456789abcdef01234567";
pub const OLD_REV: &str = "76543210fedcba9876543210fedcba9876543210";

/// Canned archive plus a client pointed at it
pub struct TestArchive {
    pub fixture: Arc<ArchiveFixture>,
    pub client: ProtocolClient,
}

impl TestArchive {
    /// Empty archive, single attempt per request
    pub fn new() -> Self {
        Self::with_max_pages(100)
    }

    /// Empty archive with a page bound
    pub fn with_max_pages(max_pages: usize) -> Self {
        let fixture = Arc::new(ArchiveFixture::new());
        let config = ClientConfig::new("https://archive.example")
            .with_retry(1, Duration::ZERO)
            .with_max_pages(max_pages);
        let client = ProtocolClient::with_transport(config, fixture.clone())
            .expect("Failed to build client");
        TestArchive { fixture, client }
    }

    /// Serve `body` at `route`
    pub fn route(&self, route: impl Into<String>, body: Value) -> &Self {
        self.fixture.route(route, body);
        self
    }

    /// Serve one snapshot page
    pub fn snapshot_page(
        &self,
        snapshot: &str,
        from: Option<&str>,
        branches: &[(&str, &str, &str)],
        next: Option<&str>,
    ) -> &Self {
        self.route(snapshot_route(snapshot, from), snapshot_body(snapshot, branches, next))
    }

    /// Serve a revision pointing at `directory`
    pub fn revision(&self, revision: &str, directory: &str) -> &Self {
        self.route(
            format!("revision/{}/", revision),
            json!({"id": revision, "directory": directory, "parents": []}),
        )
    }

    /// Serve a path lookup inside `directory`
    pub fn directory_path(&self, directory: &str, path: &str, kind: &str, target: &str) -> &Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.route(
            format!("directory/{}/{}/", directory, path),
            json!({"name": name, "type": kind, "target": target, "dir_id": directory}),
        )
    }

    /// Serve a revision log, newest first
    pub fn revision_log(&self, revision: &str, history: &[&str]) -> &Self {
        let entries: Vec<Value> = history
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let parents: Vec<Value> = history
                    .get(i + 1)
                    .map(|p| vec![json!({"id": p})])
                    .unwrap_or_default();
                json!({"id": id, "parents": parents})
            })
            .collect();
        self.route(format!("revision/{}/log/?limit=1000", revision), Value::Array(entries))
    }

    /// Routes requested so far
    pub fn routes(&self) -> Vec<String> {
        self.fixture.requested_routes()
    }
}

/// Route of a snapshot page
pub fn snapshot_route(snapshot: &str, from: Option<&str>) -> String {
    match from {
        None => format!("snapshot/{}/", snapshot),
        Some(branch) => format!(
            "snapshot/{}/?branches_from={}",
            snapshot,
            url::form_urlencoded::byte_serialize(branch.as_bytes()).collect::<String>()
        ),
    }
}

/// Snapshot body from `(name, target, target_type)` triples
pub fn snapshot_body(snapshot: &str, branches: &[(&str, &str, &str)], next: Option<&str>) -> Value {
    let listing: Map<String, Value> = branches
        .iter()
        .map(|(name, target, kind)| {
            (
                name.to_string(),
                json!({"target": target, "target_type": kind}),
            )
        })
        .collect();
    json!({"id": snapshot, "branches": listing, "next_branch": next})
}

/// Build an identifier, panicking on bad input
pub fn id(kind: ObjectKind, hex: &str) -> Swhid {
    Swhid::new(kind, hex).expect("valid test identifier")
}
