//! Commit hash requests (Tier 2)
//!
//! A 40-hex branch request first matches branch targets, then falls back
//! to searching each branch tip's logged history.

use crate::test_utils::*;
use swhdag::{traverse, Missing, ObjectKind, TraversalOutcome, TraversalRequest};

fn archive() -> TestArchive {
    let archive = TestArchive::new();
    archive.snapshot_page(
        SNP,
        None,
        &[
            ("HEAD", "refs/heads/main", "alias"),
            ("refs/heads/main", REV, "revision"),
            ("refs/heads/dev", OTHER_REV, "revision"),
        ],
        None,
    );
    archive
}

#[test]
fn test_hash_matching_a_tip() {
    let archive = archive();
    archive.revision(REV, DIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse(REV, ""),
    )
    .unwrap();
    assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, DIR)));
    assert!(!archive.routes().iter().any(|r| r.contains("/log/")));
}

#[test]
fn test_hash_found_in_history() {
    let archive = archive();
    archive
        .revision_log(OTHER_REV, &[OTHER_REV, OLD_REV])
        .revision(OLD_REV, DIR)
        .directory_path(DIR, "lib", "dir", SUBDIR);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse(OLD_REV, "lib"),
    )
    .unwrap();

    let resolved = outcome.resolved().unwrap();
    assert_eq!(resolved.revision, Some(id(ObjectKind::Revision, OLD_REV)));
    assert_eq!(resolved.target, id(ObjectKind::Directory, SUBDIR));

    let routes = archive.routes();
    // main's history is unavailable and skipped before dev's is searched
    assert!(routes.contains(&format!("revision/{}/log/?limit=1000", REV)));
    assert!(routes.contains(&format!("revision/{}/log/?limit=1000", OTHER_REV)));
}

#[test]
fn test_hash_nowhere_is_not_found() {
    let archive = archive();
    archive
        .revision_log(REV, &[REV])
        .revision_log(OTHER_REV, &[OTHER_REV]);

    let outcome = traverse(
        &archive.client,
        &id(ObjectKind::Snapshot, SNP),
        TraversalRequest::parse(OLD_REV, ""),
    )
    .unwrap();
    assert_eq!(outcome, TraversalOutcome::NotFound(Missing::Commit));
}
