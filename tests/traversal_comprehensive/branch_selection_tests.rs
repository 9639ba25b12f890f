//! Branch selection (Tier 1)

use crate::test_utils::*;
use swhdag::{traverse, Missing, ObjectKind, TraversalOutcome, TraversalRequest};

#[test]
fn test_exact_branch_beats_suffix_match() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[
                ("refs/heads/feature/main", OTHER_REV, "revision"),
                ("refs/heads/main", REV, "revision"),
            ],
            None,
        )
        .revision(REV, DIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse("main", ""),
    )
    .unwrap();
    assert_eq!(
        outcome.resolved().unwrap().revision,
        Some(id(ObjectKind::Revision, REV))
    );
}

#[test]
fn test_earlier_page_suffix_match_wins() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[("refs/heads/feature/main", OTHER_REV, "revision")],
            Some("refs/heads/main"),
        )
        .snapshot_page(
            SNP,
            Some("refs/heads/main"),
            &[("refs/heads/main", REV, "revision")],
            None,
        )
        .revision(OTHER_REV, DIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse("main", ""),
    )
    .unwrap();
    assert_eq!(
        outcome.resolved().unwrap().revision,
        Some(id(ObjectKind::Revision, OTHER_REV))
    );
    assert!(!archive
        .routes()
        .contains(&snapshot_route(SNP, Some("refs/heads/main"))));
}

#[test]
fn test_branch_name_spans_path_segments() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[
                ("refs/heads/main", OTHER_REV, "revision"),
                ("refs/heads/feature/login", REV, "revision"),
            ],
            None,
        )
        .revision(REV, DIR)
        .directory_path(DIR, "src", "dir", SUBDIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse("feature", "login/src"),
    )
    .unwrap();

    let resolved = outcome.resolved().unwrap();
    assert_eq!(resolved.revision, Some(id(ObjectKind::Revision, REV)));
    assert_eq!(resolved.path, vec!["src".to_string()]);
    assert_eq!(resolved.target, id(ObjectKind::Directory, SUBDIR));
}

#[test]
fn test_head_alias_supplies_default() {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[
                ("HEAD", "refs/heads/trunk", "alias"),
                ("refs/heads/trunk", REV, "revision"),
            ],
            None,
        )
        .revision(REV, DIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::new(),
    )
    .unwrap();
    assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, DIR)));
}

#[test]
fn test_unknown_branch_is_not_found() {
    let archive = TestArchive::new();
    archive.snapshot_page(SNP, None, &[("refs/heads/main", REV, "revision")], None);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse("release", "candidate"),
    )
    .unwrap();
    assert_eq!(outcome, TraversalOutcome::NotFound(Missing::Branch));
    // One walk for "release", one for "release/candidate"
    assert_eq!(archive.routes().len(), 2);
}
