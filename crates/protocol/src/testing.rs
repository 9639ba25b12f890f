//! Test transports
//!
//! Two in-memory [`Transport`]s for exercising the client without a network:
//!
//! - [`ScriptedTransport`] replays a queue of responses in order, which
//!   suits retry and migration scenarios.
//! - [`ArchiveFixture`] answers by route, which suits traversals that make
//!   many different calls. Unknown routes get the archive's 404 body.
//!
//! Both record every request they receive.

use crate::config::API_PREFIX;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Replays queued responses in order
///
/// Once the queue is empty every further request fails with a connection
/// error, so a test that under-scripts sees an error instead of a hang.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response
    pub fn push_response(&self, response: HttpResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Queue a JSON body with `status`
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(HttpResponse::new(status, body.to_string()));
    }

    /// Queue an empty-bodied `status`
    pub fn push_status(&self, status: u16) {
        self.push_response(HttpResponse::new(status, ""));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".to_string())))
    }
}

/// Serves canned responses keyed by route
///
/// Routes are written relative to the API prefix, query included, e.g.
/// `snapshot/<hex>/` or `revision/<hex>/log/?limit=1000`.
#[derive(Debug, Default)]
pub struct ArchiveFixture {
    routes: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ArchiveFixture {
    /// Fixture with no routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `route` with a 200 JSON body
    pub fn route(&self, route: impl Into<String>, body: Value) -> &Self {
        self.route_response(route, HttpResponse::new(200, body.to_string()))
    }

    /// Answer `route` with a raw response
    pub fn route_response(&self, route: impl Into<String>, response: HttpResponse) -> &Self {
        self.routes.lock().insert(route.into(), response);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Routes requested so far, relative to the API prefix
    pub fn requested_routes(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| route_of(&r.url).to_string())
            .collect()
    }
}

fn route_of(url: &str) -> &str {
    match url.find(API_PREFIX) {
        Some(at) => &url[at + API_PREFIX.len()..],
        None => url,
    }
}

impl Transport for ArchiveFixture {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let route = route_of(&request.url);
        let response = self.routes.lock().get(route).cloned();
        Ok(response.unwrap_or_else(|| {
            HttpResponse::new(
                404,
                serde_json::json!({
                    "exception": "NotFoundExc",
                    "reason": format!("Resource {} not found", route),
                })
                .to_string(),
            )
        }))
    }
}
