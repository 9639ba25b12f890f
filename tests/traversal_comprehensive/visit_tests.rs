//! Visits feeding traversals (Tier 2)

use crate::test_utils::*;
use chrono::DateTime;
use serde_json::{json, Value};
use swhdag::{
    snapshot_from_visit, traverse, ObjectKind, TraversalRequest, VisitHistory, VisitSelector,
};

const SNP_NEW: &str = "9999999999999999999999999999999999999999";

fn dated_history() -> Value {
    json!([
        {"origin": ORIGIN, "visit": 4, "date": "2024-04-01T00:00:00+00:00",
         "status": "partial", "snapshot": null, "type": "git"},
        {"origin": ORIGIN, "visit": 3, "date": "2024-03-01T00:00:00+00:00",
         "status": "full", "snapshot": SNP_NEW, "type": "git"},
        {"origin": ORIGIN, "visit": 2, "date": "2024-02-01T00:00:00+00:00",
         "status": "full", "snapshot": SNP, "type": "git"},
        {"origin": ORIGIN, "visit": 1, "date": "2024-01-01T00:00:00+00:00",
         "status": "full", "snapshot": SNP, "type": "git"}
    ])
}

fn date(text: &str) -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339(text).unwrap()
}

#[test]
fn test_latest_visit_to_directory() {
    let archive = TestArchive::new();
    archive
        .route(
            format!("origin/{}/visit/latest?require_snapshot=true", ORIGIN),
            json!({
                "origin": ORIGIN,
                "visit": 7,
                "date": "2024-06-01T10:00:00+00:00",
                "status": "full",
                "snapshot": SNP,
                "type": "git"
            }),
        )
        .snapshot_page(SNP, None, &[("refs/heads/main", REV, "revision")], None)
        .revision(REV, DIR);

    let snapshot = snapshot_from_visit(&archive.client, ORIGIN, VisitSelector::Latest)
        .unwrap()
        .expect("latest visit has a snapshot");
    assert_eq!(snapshot, id(ObjectKind::Snapshot, SNP));

    let outcome = traverse(&archive.client, &snapshot, TraversalRequest::new()).unwrap();
    let resolved = outcome.resolved().unwrap();
    assert_eq!(resolved.target, id(ObjectKind::Directory, DIR));
}

#[test]
fn test_single_page_history() {
    let archive = TestArchive::new();
    archive.route(
        format!("origin/{}/visits/", ORIGIN),
        json!([
            {"origin": ORIGIN, "visit": 2, "date": "2024-02-01T00:00:00+00:00",
             "status": "partial", "snapshot": null, "type": "git"},
            {"origin": ORIGIN, "visit": 1, "date": "2024-01-01T00:00:00+00:00",
             "status": "full", "snapshot": SNP, "type": "git"}
        ]),
    );

    let history = VisitHistory::fetch(&archive.client, ORIGIN).unwrap();
    assert_eq!(history.all().len(), 2);
    assert_eq!(history.last_full_visit().unwrap().visit, 1);
    assert_eq!(archive.routes().len(), 1);
}

#[test]
fn test_snapshot_by_visit_date() {
    let archive = TestArchive::new();
    archive.route(format!("origin/{}/visits/", ORIGIN), dated_history());

    // Same instant written in another offset
    let snapshot = snapshot_from_visit(
        &archive.client,
        ORIGIN,
        VisitSelector::Date(date("2024-03-01T02:00:00+02:00")),
    )
    .unwrap();
    assert_eq!(snapshot, Some(id(ObjectKind::Snapshot, SNP_NEW)));
    assert_eq!(archive.routes().len(), 1);

    let none = snapshot_from_visit(
        &archive.client,
        ORIGIN,
        VisitSelector::Date(date("2023-12-31T00:00:00+00:00")),
    )
    .unwrap();
    assert_eq!(none, None);
}

#[test]
fn test_partial_dated_visit_refetched_by_number() {
    let archive = TestArchive::new();
    archive
        .route(format!("origin/{}/visits/", ORIGIN), dated_history())
        .route(
            format!("origin/{}/visit/4", ORIGIN),
            json!({"origin": ORIGIN, "visit": 4, "date": "2024-04-01T00:00:00+00:00",
                   "status": "full", "snapshot": SNP_NEW, "type": "git"}),
        );

    let snapshot = snapshot_from_visit(
        &archive.client,
        ORIGIN,
        VisitSelector::Date(date("2024-04-01T00:00:00Z")),
    )
    .unwrap();
    assert_eq!(snapshot, Some(id(ObjectKind::Snapshot, SNP_NEW)));
    assert_eq!(
        archive.routes().last().map(String::as_str),
        Some(format!("origin/{}/visit/4", ORIGIN).as_str())
    );
}

#[test]
fn test_snapshots_by_date() {
    let archive = TestArchive::new();
    archive.route(format!("origin/{}/visits/", ORIGIN), dated_history());
    let history = VisitHistory::fetch(&archive.client, ORIGIN).unwrap();

    let all = history.snapshots_by_date(false);
    assert_eq!(all.len(), 3);
    assert_eq!(
        all.values().cloned().collect::<Vec<_>>(),
        vec![
            Some(id(ObjectKind::Snapshot, SNP)),
            Some(id(ObjectKind::Snapshot, SNP)),
            Some(id(ObjectKind::Snapshot, SNP_NEW)),
        ]
    );

    let distinct = history.snapshots_by_date(true);
    let dates: Vec<String> = distinct.keys().map(|d| d.to_rfc3339()).collect();
    assert_eq!(
        dates,
        vec!["2024-02-01T00:00:00+00:00", "2024-03-01T00:00:00+00:00"]
    );
    assert_eq!(
        distinct.values().cloned().collect::<Vec<_>>(),
        vec![
            Some(id(ObjectKind::Snapshot, SNP)),
            Some(id(ObjectKind::Snapshot, SNP_NEW)),
        ]
    );
}
