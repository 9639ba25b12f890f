//! Identifier grammar properties (Tier 1)

use proptest::prelude::*;
use swhdag::{format_swhid, ObjectKind, Swhid, SwhidError};

fn kind() -> impl Strategy<Value = ObjectKind> {
    prop::sample::select(ObjectKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_short_hex_rejected(kind in kind(), hex in "[0-9a-f]{1,39}") {
        prop_assert!(format_swhid(kind, &hex).is_err());
    }

    #[test]
    fn prop_qualifiers_ignored(kind in kind(), hex in "[0-9a-f]{40}", origin in "[a-z]{1,12}") {
        let bare = format_swhid(kind, &hex).unwrap();
        let qualified = format!("{};origin=https://{}.example", bare, origin);
        prop_assert_eq!(Swhid::parse_qualified(&qualified).unwrap(), Swhid::parse(&bare).unwrap());
    }
}

#[test]
fn test_grammar_rejections() {
    let hex = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    assert!(Swhid::parse("swh:1:rev:not-hex").is_err());
    assert!(Swhid::parse(&format!("swh:2:rev:{}", hex)).is_err());
    assert!(matches!(
        Swhid::parse(&format!("swh:1:bogus:{}", hex)),
        Err(SwhidError::UnknownKind(_))
    ));
}

#[test]
fn test_uppercase_hex_normalizes() {
    let id = Swhid::parse("swh:1:dir:CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC").unwrap();
    assert_eq!(id.hex(), "cccccccccccccccccccccccccccccccccccccccc");
}
