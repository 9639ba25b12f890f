//! Endpoint table and argument validation
//!
//! Every archive call names a logical endpoint. Each endpoint carries the
//! shape of its first argument and a route template under [`API_PREFIX`]
//! whose `~` placeholders are filled in order.
//!
//! | Endpoint | First arg | Route |
//! |----------|-----------|-------|
//! | `origin` | URL | `origin/~/get/` |
//! | `visit` | URL | `origin/~/visit/~` |
//! | `visits` | URL | `origin/~/visits/~` |
//! | `save` | URL | `origin/save/~/url/~/` |
//! | `saveWithID` | integer | `origin/save/~/` |
//! | `resolve` | SWHID | `resolve/~/` |
//! | `snapshot` | SHA1 | `snapshot/~/` |
//! | `release` | SHA1 | `release/~/` |
//! | `revision` | SHA1 | `revision/~/` |
//! | `revisionLog` | SHA1 | `revision/~/log/~` |
//! | `revisionPath` | SHA1 | `revision/~/directory/~/` |
//! | `directory` | SHA1 | `directory/~/` |
//! | `directoryPath` | SHA1 | `directory/~/~/` |
//! | `content` | SHA1 | `content/sha1_git:~/` |
//!
//! [`API_PREFIX`]: crate::config::API_PREFIX

use crate::error::{ProtocolError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use swhdag_core::Swhid;

const PLACEHOLDER: char = '~';

/// Longest origin URL accepted by URL-kind endpoints
pub const MAX_URL_LENGTH: usize = 255;

/// 40 hex digits, optionally followed by `/` and a query or path suffix
static SHA1_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-f0-9]{40}(?:/\??\S*)?$").expect("static regex"));

/// HTTP verbs the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// HEAD, used for existence checks
    Head,
}

impl Method {
    /// Upper-case verb
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "HEAD" => Ok(Method::Head),
            _ => Err(ProtocolError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Shape required of an endpoint's first argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Absolute URL of at most [`MAX_URL_LENGTH`] characters
    Url,
    /// 40-hex hash with an optional `/suffix`
    Sha1,
    /// Non-negative integer
    Integer,
    /// Full identifier; qualifiers after `;` are allowed
    Swhid,
}

/// Logical archive endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Origin metadata
    Origin,
    /// One visit of an origin
    Visit,
    /// Page of visits of an origin
    Visits,
    /// Save-code-now request
    Save,
    /// Save-code-now request status by id
    SaveWithId,
    /// Identifier resolution
    Resolve,
    /// Snapshot branches
    Snapshot,
    /// Release
    Release,
    /// Revision
    Revision,
    /// Revision history
    RevisionLog,
    /// Path lookup from a revision's root directory
    RevisionPath,
    /// Directory listing
    Directory,
    /// Path lookup from a directory
    DirectoryPath,
    /// File content metadata
    Content,
}

impl Endpoint {
    /// Every endpoint, in table order
    pub const ALL: [Endpoint; 14] = [
        Endpoint::Origin,
        Endpoint::Visit,
        Endpoint::Visits,
        Endpoint::Save,
        Endpoint::SaveWithId,
        Endpoint::Resolve,
        Endpoint::Snapshot,
        Endpoint::Release,
        Endpoint::Revision,
        Endpoint::RevisionLog,
        Endpoint::RevisionPath,
        Endpoint::Directory,
        Endpoint::DirectoryPath,
        Endpoint::Content,
    ];

    /// Logical name
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Origin => "origin",
            Endpoint::Visit => "visit",
            Endpoint::Visits => "visits",
            Endpoint::Save => "save",
            Endpoint::SaveWithId => "saveWithID",
            Endpoint::Resolve => "resolve",
            Endpoint::Snapshot => "snapshot",
            Endpoint::Release => "release",
            Endpoint::Revision => "revision",
            Endpoint::RevisionLog => "revisionLog",
            Endpoint::RevisionPath => "revisionPath",
            Endpoint::Directory => "directory",
            Endpoint::DirectoryPath => "directoryPath",
            Endpoint::Content => "content",
        }
    }

    /// Route template relative to the API prefix
    pub fn route(&self) -> &'static str {
        match self {
            Endpoint::Origin => "origin/~/get/",
            Endpoint::Visit => "origin/~/visit/~",
            Endpoint::Visits => "origin/~/visits/~",
            Endpoint::Save => "origin/save/~/url/~/",
            Endpoint::SaveWithId => "origin/save/~/",
            Endpoint::Resolve => "resolve/~/",
            Endpoint::Snapshot => "snapshot/~/",
            Endpoint::Release => "release/~/",
            Endpoint::Revision => "revision/~/",
            Endpoint::RevisionLog => "revision/~/log/~",
            Endpoint::RevisionPath => "revision/~/directory/~/",
            Endpoint::Directory => "directory/~/",
            Endpoint::DirectoryPath => "directory/~/~/",
            Endpoint::Content => "content/sha1_git:~/",
        }
    }

    /// Shape of the first argument
    pub fn arg_kind(&self) -> ArgKind {
        match self {
            Endpoint::Origin | Endpoint::Visit | Endpoint::Visits | Endpoint::Save => ArgKind::Url,
            Endpoint::SaveWithId => ArgKind::Integer,
            Endpoint::Resolve => ArgKind::Swhid,
            _ => ArgKind::Sha1,
        }
    }

    /// Number of `~` placeholders in the route
    pub fn arity(&self) -> usize {
        self.route().matches(PLACEHOLDER).count()
    }

    /// Look up an endpoint by logical name
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name() == name)
            .ok_or_else(|| ProtocolError::UnknownEndpoint(name.to_string()))
    }

    /// Validate `args` and render the route path relative to the API prefix
    ///
    /// An argument may carry a query (`<hex>/?branches_from=x`,
    /// `?limit=1000`); the query is moved behind the rest of the route so
    /// the template's trailing `/` stays in the path. Origin URLs are
    /// inserted verbatim.
    ///
    /// # Errors
    ///
    /// `Validation` when the argument count differs from the placeholder
    /// count or the first argument has the wrong shape.
    pub fn render(&self, args: &[EndpointArg]) -> Result<String> {
        let rendered = self.validate(args)?;
        let url_first = self.arg_kind() == ArgKind::Url;

        let mut values = rendered.iter().enumerate();
        let mut path = String::with_capacity(self.route().len() + 64);
        let mut query: Option<&str> = None;

        for ch in self.route().chars() {
            if ch != PLACEHOLDER {
                path.push(ch);
                continue;
            }
            // Counts were checked by validate.
            let Some((i, value)) = values.next() else {
                break;
            };
            match value.split_once('?') {
                Some((head, q)) if !(url_first && i == 0) => {
                    path.push_str(head.trim_end_matches('/'));
                    query = Some(q);
                }
                _ => path.push_str(value),
            }
        }

        if let Some(q) = query {
            path.push('?');
            path.push_str(q);
        }
        Ok(path)
    }

    /// Check argument count and first-argument shape
    ///
    /// Returns the arguments as route text, in route order.
    pub fn validate(&self, args: &[EndpointArg]) -> Result<Vec<String>> {
        if args.len() != self.arity() {
            return Err(self.invalid(format!(
                "expected {} argument(s), got {}",
                self.arity(),
                args.len()
            )));
        }

        let mut rendered: Vec<String> = args.iter().map(EndpointArg::to_string).collect();
        let first = &args[0];

        match (self.arg_kind(), first) {
            (ArgKind::Integer, EndpointArg::Integer(_)) => {}
            (ArgKind::Integer, EndpointArg::Text(text)) => {
                if text.parse::<u64>().is_err() {
                    return Err(self.invalid(format!("'{}' is not an integer", text)));
                }
            }
            (kind, EndpointArg::Integer(n)) => {
                return Err(self.invalid(format!("expected {:?}, got integer {}", kind, n)));
            }
            (ArgKind::Url, EndpointArg::Text(text)) => {
                check_url(text).map_err(|reason| self.invalid(reason))?;
                rendered[0] = text.trim_end_matches('/').to_string();
            }
            (ArgKind::Sha1, EndpointArg::Text(text)) => {
                if !SHA1_ARG.is_match(text) {
                    return Err(self.invalid(format!("'{}' is not a 40-hex hash", text)));
                }
            }
            (ArgKind::Swhid, EndpointArg::Text(text)) => {
                Swhid::parse_qualified(text).map_err(|e| self.invalid(e.to_string()))?;
            }
        }

        if *self == Endpoint::Save {
            rendered.swap(0, 1);
        }
        Ok(rendered)
    }

    fn invalid(&self, reason: String) -> ProtocolError {
        ProtocolError::Validation {
            endpoint: self.name(),
            reason,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

fn check_url(text: &str) -> std::result::Result<(), String> {
    if text.chars().count() > MAX_URL_LENGTH {
        return Err(format!("URL longer than {} characters", MAX_URL_LENGTH));
    }
    let parsed = url::Url::parse(text).map_err(|e| format!("'{}' is not a URL: {}", text, e))?;
    if !parsed.has_host() {
        return Err(format!("'{}' has no host", text));
    }
    Ok(())
}

/// One route argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointArg {
    /// Text inserted verbatim
    Text(String),
    /// Integer argument
    Integer(u64),
}

impl fmt::Display for EndpointArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointArg::Text(text) => f.write_str(text),
            EndpointArg::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for EndpointArg {
    fn from(s: &str) -> Self {
        EndpointArg::Text(s.to_string())
    }
}

impl From<String> for EndpointArg {
    fn from(s: String) -> Self {
        EndpointArg::Text(s)
    }
}

impl From<&String> for EndpointArg {
    fn from(s: &String) -> Self {
        EndpointArg::Text(s.clone())
    }
}

impl From<u64> for EndpointArg {
    fn from(n: u64) -> Self {
        EndpointArg::Integer(n)
    }
}

impl From<Swhid> for EndpointArg {
    fn from(id: Swhid) -> Self {
        EndpointArg::Text(id.to_string())
    }
}

/// Build an argument list from heterogeneous values
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::endpoint::EndpointArg::from($arg)),*]
    };
}
