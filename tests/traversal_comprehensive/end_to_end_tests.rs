//! End-to-end traversals (Tier 2)
//!
//! Snapshot → branch → revision → root directory → path, with the
//! contextual identifiers of the result.

use crate::test_utils::*;
use swhdag::{
    traverse, traverse_from_directory, ContextKind, Missing, Node, ObjectKind, TraversalOutcome,
    TraversalRequest,
};

fn archive() -> TestArchive {
    let archive = TestArchive::new();
    archive
        .snapshot_page(
            SNP,
            None,
            &[
                ("HEAD", "refs/heads/main", "alias"),
                ("refs/heads/main", REV, "revision"),
                ("refs/tags/v1.0", REL, "release"),
            ],
            None,
        )
        .revision(REV, DIR)
        .directory_path(DIR, "lib", "dir", SUBDIR)
        .directory_path(DIR, "lib/mod.rs", "file", CNT)
        .route(
            format!("release/{}/", REL),
            serde_json::json!({"name": "v1.0", "target": REV, "target_type": "revision"}),
        );
    archive
}

// =============================================================================
// Snapshot starts
// =============================================================================

mod from_snapshot {
    use super::*;

    #[test]
    fn test_main_branch_to_subdirectory() {
        let archive = archive();
        let outcome = traverse(
            &archive.client,
            &id(ObjectKind::Snapshot, SNP),
            TraversalRequest::parse("main", "lib"),
        )
        .unwrap();

        let resolved = outcome.resolved().expect("traversal resolves");
        assert_eq!(resolved.target.to_string(), format!("swh:1:dir:{}", SUBDIR));

        let contexts = resolved.contexts(ORIGIN);
        let ctx = contexts[&ContextKind::Directory]
            .as_deref()
            .expect("directory context");
        assert!(ctx.contains(SUBDIR));
        assert!(ctx.contains(ORIGIN));
        assert!(ctx.contains(SNP));
        assert!(ctx.contains(REV));
        assert_eq!(
            contexts[&ContextKind::Snapshot].as_deref(),
            Some(format!("swh:1:snp:{};origin={}", SNP, ORIGIN).as_str())
        );
    }

    #[test]
    fn test_request_sequence() {
        let archive = archive();
        traverse(
            &archive.client,
            &id(ObjectKind::Snapshot, SNP),
            TraversalRequest::parse("main", "lib"),
        )
        .unwrap();
        assert_eq!(
            archive.routes(),
            vec![
                format!("snapshot/{}/", SNP),
                format!("revision/{}/", REV),
                format!("directory/{}/lib/", DIR),
            ]
        );
    }

    #[test]
    fn test_default_branch_and_file() {
        let archive = archive();
        let outcome = traverse(
            &archive.client,
            &id(ObjectKind::Snapshot, SNP),
            TraversalRequest::path("lib/mod.rs"),
        )
        .unwrap();
        let resolved = outcome.resolved().unwrap();
        assert_eq!(resolved.target, id(ObjectKind::Content, CNT));

        let contexts = resolved.contexts(ORIGIN);
        assert_eq!(contexts.len(), 1);
        let ctx = contexts[&ContextKind::Content].as_deref().unwrap();
        assert!(ctx.starts_with(&format!("swh:1:cnt:{};origin={}", CNT, ORIGIN)));
        assert!(ctx.ends_with(";path=lib/mod.rs"));
    }

    #[test]
    fn test_tag_through_release() {
        let archive = archive();
        let outcome = traverse(
            &archive.client,
            &id(ObjectKind::Snapshot, SNP),
            TraversalRequest::parse("v1.0", ""),
        )
        .unwrap();
        let resolved = outcome.resolved().unwrap();
        assert_eq!(resolved.release, Some(id(ObjectKind::Release, REL)));
        assert_eq!(resolved.target, id(ObjectKind::Directory, DIR));
    }

    #[test]
    fn test_missing_path() {
        let archive = archive();
        let outcome = traverse(
            &archive.client,
            &id(ObjectKind::Snapshot, SNP),
            TraversalRequest::parse("main", "nope"),
        )
        .unwrap();
        assert_eq!(outcome, TraversalOutcome::NotFound(Missing::Path));
    }
}

// =============================================================================
// Other starts
// =============================================================================

mod from_other_nodes {
    use super::*;

    #[test]
    fn test_empty_path_returns_directory() {
        let archive = archive();
        let outcome =
            traverse_from_directory(&archive.client, &id(ObjectKind::Directory, DIR), "").unwrap();
        assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, DIR)));
        assert!(archive.routes().is_empty());
    }

    #[test]
    fn test_revision_start_skips_branches() {
        let archive = archive();
        let outcome = traverse(
            &archive.client,
            &id(ObjectKind::Revision, REV),
            TraversalRequest::path("lib"),
        )
        .unwrap();
        assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, SUBDIR)));
        assert!(!archive.routes().iter().any(|r| r.starts_with("snapshot/")));
    }

    #[test]
    fn test_node_handle_traverses() {
        let archive = archive();
        let node = Node::new(archive.client.clone(), id(ObjectKind::Release, REL));
        let outcome = node.traverse(TraversalRequest::path("lib")).unwrap();
        assert_eq!(outcome.target(), Some(id(ObjectKind::Directory, SUBDIR)));
    }
}
