//! Snapshot pagination (Tier 1)

use crate::test_utils::*;
use swhdag::{
    full_snapshot, snapshot_edges, traverse, GraphError, ObjectKind, ProtocolError,
    TraversalRequest,
};

fn three_pages(archive: &TestArchive) {
    archive
        .snapshot_page(
            SNP,
            None,
            &[
                ("HEAD", "refs/heads/main", "alias"),
                ("refs/heads/a", OTHER_REV, "revision"),
            ],
            Some("refs/heads/b"),
        )
        .snapshot_page(
            SNP,
            Some("refs/heads/b"),
            &[
                ("refs/heads/b", OTHER_REV, "revision"),
                ("refs/heads/c", OLD_REV, "revision"),
            ],
            Some("refs/heads/main"),
        )
        .snapshot_page(
            SNP,
            Some("refs/heads/main"),
            &[
                ("refs/heads/main", REV, "revision"),
                ("refs/tags/v1", REL, "release"),
            ],
            None,
        );
}

#[test]
fn test_merged_edges_drop_head() {
    let archive = TestArchive::new();
    three_pages(&archive);

    let edges = snapshot_edges(&archive.client, &id(ObjectKind::Snapshot, SNP)).unwrap();
    assert_eq!(edges.len(), 6 - 1);
    assert!(!edges.contains_key("HEAD"));
    assert_eq!(
        edges["refs/tags/v1"],
        Some(id(ObjectKind::Release, REL))
    );
}

#[test]
fn test_cursor_is_form_encoded() {
    let archive = TestArchive::new();
    three_pages(&archive);
    snapshot_edges(&archive.client, &id(ObjectKind::Snapshot, SNP)).unwrap();

    assert_eq!(
        archive.routes()[1],
        format!("snapshot/{}/?branches_from=refs%2Fheads%2Fb", SNP)
    );
}

#[test]
fn test_full_snapshot_terminates_cursor() {
    let archive = TestArchive::new();
    three_pages(&archive);

    let response = full_snapshot(&archive.client, &id(ObjectKind::Snapshot, SNP)).unwrap();
    assert!(response.body()["next_branch"].is_null());
    assert_eq!(response.body()["branches"].as_object().unwrap().len(), 6);
}

#[test]
fn test_first_seen_branch_wins() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[("refs/heads/main", REV, "revision")],
            Some("refs/heads/x"),
        )
        .snapshot_page(
            SNP,
            Some("refs/heads/x"),
            &[("refs/heads/main", OTHER_REV, "revision")],
            None,
        );

    let edges = snapshot_edges(&archive.client, &id(ObjectKind::Snapshot, SNP)).unwrap();
    assert_eq!(edges["refs/heads/main"], Some(id(ObjectKind::Revision, REV)));
}

#[test]
fn test_traversal_stops_at_matching_page() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[("refs/heads/main", REV, "revision")],
            Some("refs/heads/zzz"),
        )
        .revision(REV, DIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse("main", ""),
    )
    .unwrap();
    assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, DIR)));
    assert_eq!(archive.routes().len(), 2);
}

#[test]
fn test_page_bound() {
    let archive = TestArchive::with_max_pages(2);
    three_pages(&archive);

    let err = snapshot_edges(&archive.client, &id(ObjectKind::Snapshot, SNP)).unwrap_err();
    assert_eq!(err, GraphError::Protocol(ProtocolError::PageLimit { max: 2 }));
    assert_eq!(archive.routes().len(), 2);
}
