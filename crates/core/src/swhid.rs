//! SWHID grammar
//!
//! A SWHID names one node of the archive's Merkle DAG by content hash:
//!
//! ```text
//! swh:1:<kind>:<40 hex digits>
//! ```
//!
//! ## Validation
//!
//! Identifiers must:
//! - Contain exactly three `:` separators
//! - Use one of the kinds `ori`, `snp`, `rev`, `rel`, `dir`, `cnt`
//! - Start with the header `swh:1` (compared case-insensitively)
//! - End with 40 hexadecimal characters, normalized to lowercase
//!
//! Whitespace anywhere in the text is stripped before validation.

use crate::error::{Result, SwhidError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Namespace prefix of every identifier
pub const SWHID_NAMESPACE: &str = "swh";

/// Scheme version of every identifier
pub const SWHID_VERSION: u32 = 1;

/// Length of the hash segment
pub const HEX_LENGTH: usize = 40;

const SEPARATOR: char = ':';
const QUALIFIER_SEPARATOR: char = ';';

/// The kind of DAG node an identifier points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Software origin (repository URL)
    Origin,
    /// Set of branches captured by one visit
    Snapshot,
    /// Commit-like node
    Revision,
    /// Named pointer to a revision or release
    Release,
    /// Tree node
    Directory,
    /// File contents (leaf)
    Content,
}

impl ObjectKind {
    /// All kinds, in DAG order
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Origin,
        ObjectKind::Snapshot,
        ObjectKind::Revision,
        ObjectKind::Release,
        ObjectKind::Directory,
        ObjectKind::Content,
    ];

    /// Three-letter tag used inside a SWHID (`rev`, `dir`, ...)
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Origin => "ori",
            ObjectKind::Snapshot => "snp",
            ObjectKind::Revision => "rev",
            ObjectKind::Release => "rel",
            ObjectKind::Directory => "dir",
            ObjectKind::Content => "cnt",
        }
    }

    /// Type name used by the archive API (`revision`, `directory`, ...)
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Origin => "origin",
            ObjectKind::Snapshot => "snapshot",
            ObjectKind::Revision => "revision",
            ObjectKind::Release => "release",
            ObjectKind::Directory => "directory",
            ObjectKind::Content => "content",
        }
    }

    /// Look up a kind from its three-letter tag
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| SwhidError::UnknownKind(tag.to_string()))
    }

    /// Look up a kind from its API type name
    pub fn from_type_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == name)
            .ok_or_else(|| SwhidError::UnknownKind(name.to_string()))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A validated, normalized SWHID
///
/// Immutable value type: a kind plus a lowercase 40-hex hash. Two
/// identifiers are equal exactly when their canonical texts are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swhid {
    kind: ObjectKind,
    hex: [u8; HEX_LENGTH],
}

impl Swhid {
    /// Build an identifier from a kind and a hash
    ///
    /// The hash may use either case; it is stored lowercase.
    pub fn new(kind: ObjectKind, hex: &str) -> Result<Self> {
        if !is_sha1_hex(hex) {
            return Err(SwhidError::InvalidHex(hex.to_string()));
        }
        let mut buf = [0u8; HEX_LENGTH];
        for (slot, byte) in buf.iter_mut().zip(hex.bytes()) {
            *slot = byte.to_ascii_lowercase();
        }
        Ok(Swhid { kind, hex: buf })
    }

    /// Parse the canonical text form
    ///
    /// # Errors
    ///
    /// Returns `SwhidError` if the text violates the grammar. Nothing is
    /// constructed on failure.
    pub fn parse(text: &str) -> Result<Self> {
        let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        let found = text.matches(SEPARATOR).count();
        if found != 3 {
            return Err(SwhidError::SeparatorCount { found });
        }

        let parts: Vec<&str> = text.split(SEPARATOR).collect();
        let (namespace, version, tag, hex) = (parts[0], parts[1], parts[2], parts[3]);

        let kind = ObjectKind::from_tag(tag)?;

        let expected = format!("{}{}{}", SWHID_NAMESPACE, SEPARATOR, SWHID_VERSION);
        let header = format!("{}{}{}", namespace, SEPARATOR, version);
        if !header.eq_ignore_ascii_case(&expected) {
            return Err(SwhidError::Header { found: header });
        }

        Self::new(kind, hex)
    }

    /// Parse an identifier that may carry `;key=value` qualifiers
    ///
    /// Qualifiers are discarded; only the core identifier is validated.
    pub fn parse_qualified(text: &str) -> Result<Self> {
        Self::parse(strip_qualifiers(text))
    }

    /// The node kind
    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The lowercase hash segment
    #[inline]
    pub fn hex(&self) -> &str {
        // Construction only admits ASCII hex digits.
        std::str::from_utf8(&self.hex).unwrap_or_default()
    }

    /// Check this identifier has the expected kind
    pub fn expect_kind(self, expected: ObjectKind) -> Result<Self> {
        if self.kind != expected {
            return Err(SwhidError::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for Swhid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            SWHID_NAMESPACE,
            SWHID_VERSION,
            self.kind.tag(),
            self.hex(),
            sep = SEPARATOR
        )
    }
}

impl fmt::Debug for Swhid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Swhid({})", self)
    }
}

impl FromStr for Swhid {
    type Err = SwhidError;

    fn from_str(s: &str) -> Result<Self> {
        Swhid::parse(s)
    }
}

impl TryFrom<&str> for Swhid {
    type Error = SwhidError;

    fn try_from(value: &str) -> Result<Self> {
        Swhid::parse(value)
    }
}

impl TryFrom<String> for Swhid {
    type Error = SwhidError;

    fn try_from(value: String) -> Result<Self> {
        Swhid::parse(&value)
    }
}

impl Serialize for Swhid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Swhid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Swhid::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Check that `s` is exactly 40 hexadecimal characters (either case)
#[inline]
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == HEX_LENGTH && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The part of a qualified identifier before the first `;`
pub fn strip_qualifiers(text: &str) -> &str {
    text.split(QUALIFIER_SEPARATOR).next().unwrap_or(text)
}

/// Format a canonical identifier from a kind and a hash
///
/// The hash is lowercased in the output.
pub fn format_swhid(kind: ObjectKind, hex: &str) -> Result<String> {
    Swhid::new(kind, hex).map(|id| id.to_string())
}

/// Parse `text` and return its hash, requiring `expected` kind
///
/// Guards kind-specific endpoints: the revision endpoint must not be handed
/// a snapshot identifier.
pub fn extract_hex(text: &str, expected: ObjectKind) -> Result<String> {
    let id = Swhid::parse(text)?.expect_kind(expected)?;
    Ok(id.hex().to_string())
}

// ============================================================================
// Tests
// ============================================================================
