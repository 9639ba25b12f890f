//! Protocol client
//!
//! Validates calls against the endpoint table, sends them through a
//! [`Transport`], and applies the retry policy from [`crate::retry`].
//! Clones share one [`EndpointState`], so a migration seen by one clone is
//! seen by all of them. Separately constructed clients never share state.

use crate::config::{ApiEndpoint, ClientConfig, API_PREFIX};
use crate::endpoint::{Endpoint, EndpointArg, Method};
use crate::error::{ProtocolError, Result};
use crate::response::Response;
use crate::retry::{decide, AttemptOutcome, EndpointState, RetryDecision, RetryPolicy};
use crate::transport::{Headers, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const JSON: &str = "application/json";

/// Redirects followed on endpoint calls
const ROUTE_REDIRECTS: u32 = 1;
/// Redirects followed on absolute-URL calls
const ABSOLUTE_REDIRECTS: u32 = 2;

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Route(&'a str),
    Absolute(&'a str),
}

/// Client for the archive's HTTP API
#[derive(Clone)]
pub struct ProtocolClient {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<EndpointState>>,
    policy: RetryPolicy,
    max_pages: usize,
    user_agent: String,
    accept: String,
}

impl fmt::Debug for ProtocolClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("endpoint", &self.state.lock().current().api_url)
            .field("policy", &self.policy)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl ProtocolClient {
    /// Client backed by `ureq`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.connect_timeout, config.timeout);
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client backed by any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(ProtocolClient {
            transport,
            state: Arc::new(Mutex::new(EndpointState::new(
                config.primary,
                config.secondary,
            ))),
            policy: RetryPolicy {
                max_attempts: config.max_attempts,
                delay: config.retry_delay,
            },
            max_pages: config.max_pages,
            user_agent: config.user_agent,
            accept: config.accept,
        })
    }

    /// Page bound for paginated fetches
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Deployment currently in use
    pub fn current_endpoint(&self) -> ApiEndpoint {
        self.state.lock().current().clone()
    }

    /// False once a 403 moved this client to the secondary
    pub fn on_primary(&self) -> bool {
        self.state.lock().on_primary()
    }

    /// Call an endpoint
    ///
    /// # Errors
    ///
    /// Local validation errors are returned before anything is sent.
    /// Remote failures surface after the retry policy gives up.
    pub fn invoke(&self, method: Method, endpoint: Endpoint, args: &[EndpointArg]) -> Result<Response> {
        let path = endpoint.render(args).map_err(|e| {
            error!(target: "swh::protocol", endpoint = endpoint.name(), error = %e, "Invalid call");
            e
        })?;
        self.execute(method, Target::Route(&path), endpoint.name(), ROUTE_REDIRECTS)
    }

    /// Call an endpoint given its verb and logical name as text
    pub fn invoke_named(&self, method: &str, endpoint: &str, args: &[EndpointArg]) -> Result<Response> {
        let method: Method = method.parse()?;
        let endpoint: Endpoint = endpoint.parse()?;
        self.invoke(method, endpoint, args)
    }

    /// GET an endpoint
    pub fn get(&self, endpoint: Endpoint, args: &[EndpointArg]) -> Result<Response> {
        self.invoke(Method::Get, endpoint, args)
    }

    /// Call an absolute URL, e.g. a `Link` continuation
    pub fn invoke_url(&self, method: Method, url: &str) -> Result<Response> {
        url::Url::parse(url).map_err(|e| ProtocolError::Validation {
            endpoint: "url",
            reason: format!("'{}' is not a URL: {}", url, e),
        })?;
        self.execute(method, Target::Absolute(url), "url", ABSOLUTE_REDIRECTS)
    }

    /// HEAD an endpoint: `true` on 2xx, `false` on 404
    pub fn exists(&self, endpoint: Endpoint, args: &[EndpointArg]) -> Result<bool> {
        match self.invoke(Method::Head, endpoint, args) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn request(&self, method: Method, target: Target<'_>, accept: &str, max_redirects: u32) -> HttpRequest {
        let state = self.state.lock();
        let endpoint = state.current();

        let url = match target {
            Target::Route(path) => format!("{}{}{}", endpoint.base(), API_PREFIX, path),
            Target::Absolute(url) => url.to_string(),
        };

        let mut headers = Headers::new();
        headers.set("Accept", accept);
        headers.set("User-Agent", self.user_agent.as_str());
        if let Some(token) = &endpoint.token {
            headers.set("Authorization", format!("Bearer {}", token));
        }

        HttpRequest {
            method,
            url,
            headers,
            max_redirects,
        }
    }

    fn execute(&self, method: Method, target: Target<'_>, label: &str, max_redirects: u32) -> Result<Response> {
        let mut accept = self.accept.clone();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let request = self.request(method, target, &accept, max_redirects);

            if attempt == 1 {
                info!(
                    target: "swh::protocol",
                    method = %method,
                    endpoint = label,
                    url = %request.url,
                    "Invoking endpoint"
                );
            } else {
                debug!(target: "swh::protocol", attempt, url = %request.url, "Sending retry");
            }

            let (outcome, failure) = match self.transport.send(&request) {
                Ok(raw) if (200..300).contains(&raw.status) => {
                    return Response::decode(raw.status, request.url, raw.headers, &raw.body)
                        .map_err(|e| {
                            error!(target: "swh::protocol", endpoint = label, error = %e, "Undecodable response");
                            e
                        });
                }
                Ok(raw) => classify_status(&raw),
                Err(e) => classify_transport(e),
            };

            let decision = decide(outcome, &self.state.lock());
            if decision == RetryDecision::Fail || !self.policy.allows_another(attempt) {
                error!(
                    target: "swh::protocol",
                    endpoint = label,
                    url = %request.url,
                    attempt,
                    error = %failure,
                    "Request failed"
                );
                return Err(failure);
            }

            match decision {
                RetryDecision::RetryAcceptJson => accept = JSON.to_string(),
                RetryDecision::Migrate => {
                    let mut state = self.state.lock();
                    if state.migrate() {
                        warn!(
                            target: "swh::protocol",
                            api_url = %state.current().api_url,
                            "Forbidden on primary endpoint, switching to secondary"
                        );
                    }
                }
                RetryDecision::Retry | RetryDecision::Fail => {}
            }

            warn!(
                target: "swh::protocol",
                endpoint = label,
                attempt,
                max_attempts = self.policy.max_attempts,
                error = %failure,
                "Retrying request"
            );
            if !self.policy.delay.is_zero() {
                std::thread::sleep(self.policy.delay);
            }
        }
    }
}

fn classify_status(raw: &HttpResponse) -> (AttemptOutcome, ProtocolError) {
    if (300..400).contains(&raw.status) {
        return (AttemptOutcome::RedirectLimit, ProtocolError::RedirectLimit);
    }
    (
        AttemptOutcome::Status(raw.status),
        ProtocolError::RemoteStatus {
            code: raw.status,
            reason: remote_reason(&raw.body),
        },
    )
}

fn classify_transport(err: TransportError) -> (AttemptOutcome, ProtocolError) {
    let outcome = AttemptOutcome::from(&err);
    let failure = match err {
        TransportError::TooManyRedirects => ProtocolError::RedirectLimit,
        other => ProtocolError::Transport(other.to_string()),
    };
    (outcome, failure)
}

/// The archive reports failures as `{"exception": ..., "reason": ...}`
fn remote_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("reason")
        .and_then(|r| r.as_str())
        .map(str::to_string)
}
