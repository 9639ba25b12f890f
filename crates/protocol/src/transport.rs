//! HTTP transport seam
//!
//! The client speaks to the network only through [`Transport`]. The real
//! implementation wraps a `ureq` agent; tests plug in
//! [`ScriptedTransport`](crate::testing::ScriptedTransport).

use crate::endpoint::Method;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure below the HTTP status layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// DNS, TCP, TLS or body read failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete in time
    #[error("request timed out")]
    Timeout,

    /// The redirect cap was exceeded
    #[error("too many redirects")]
    TooManyRedirects,
}

/// Case-insensitive response headers, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with `value`
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    /// Append a value without removing existing ones
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// All pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no headers
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Target of the `rel="next"` entry of the `Link` header
    ///
    /// The archive sends `<https://...>; rel="next"`, possibly alongside
    /// other relations separated by commas.
    pub fn link_next(&self) -> Option<String> {
        let link = self.get("link")?;
        link.split(',').find_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts.next()?.trim();
            let is_next = parts.any(|p| {
                let p = p.trim().replace(' ', "");
                p.eq_ignore_ascii_case("rel=\"next\"") || p.eq_ignore_ascii_case("rel=next")
            });
            if !is_next {
                return None;
            }
            let target = target.trim_start_matches('<').trim_end_matches('>');
            (!target.is_empty()).then(|| target.to_string())
        })
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Headers(iter.into_iter().collect())
    }
}

/// One physical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Verb
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Redirects the transport may follow
    pub max_redirects: u32,
}

/// Raw response, before any status handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Body text; empty for HEAD
    pub body: String,
}

impl HttpResponse {
    /// Response with a body and no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Builder form of header insertion
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// Sends one request and returns whatever status came back
///
/// Implementations must not turn HTTP error statuses into `Err`; status
/// handling belongs to the retry policy.
pub trait Transport: Send + Sync {
    /// Perform the request
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `ureq`-backed transport
///
/// Agents hold the connection pool, so one is built per redirect cap and
/// reused for every request with that cap.
#[derive(Clone)]
pub struct UreqTransport {
    connect_timeout: Duration,
    timeout: Duration,
    agents: Arc<Mutex<BTreeMap<u32, ureq::Agent>>>,
}

impl UreqTransport {
    /// Transport with the given connect and overall timeouts
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        UreqTransport {
            connect_timeout,
            timeout,
            agents: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn agent(&self, max_redirects: u32) -> ureq::Agent {
        self.agents
            .lock()
            .entry(max_redirects)
            .or_insert_with(|| {
                let config = ureq::Agent::config_builder()
                    .timeout_global(Some(self.timeout))
                    .timeout_connect(Some(self.connect_timeout))
                    .http_status_as_error(false)
                    .max_redirects(max_redirects)
                    .build();
                ureq::Agent::new_with_config(config)
            })
            .clone()
    }

    fn agent_count(&self) -> usize {
        self.agents.lock().len()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .field("agents", &self.agent_count())
            .finish()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(request.max_redirects);
        let url = request.url.as_str();

        let result = match request.method {
            Method::Get => {
                let mut builder = agent.get(url);
                for (name, value) in request.headers.iter() {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            Method::Head => {
                let mut builder = agent.head(url);
                for (name, value) in request.headers.iter() {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            Method::Post => {
                let mut builder = agent.post(url);
                for (name, value) in request.headers.iter() {
                    builder = builder.header(name, value);
                }
                builder.send_empty()
            }
        };

        let mut response = result.map_err(|e| match e {
            ureq::Error::TooManyRedirects => TransportError::TooManyRedirects,
            ureq::Error::Timeout(_) => TransportError::Timeout,
            other => TransportError::Connection(other.to_string()),
        })?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = if request.method == Method::Head {
            String::new()
        } else {
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::Connection(format!("failed to read body: {}", e)))?
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
