//! Retry policy and endpoint migration state
//!
//! Each physical request is classified into an [`AttemptOutcome`] and fed
//! through [`decide`]. The table is evaluated top to bottom:
//!
//! | Outcome | Decision |
//! |---------|----------|
//! | connection failure, timeout, 5xx | `Retry` |
//! | 406 | `RetryAcceptJson` |
//! | 403 on the primary with a secondary configured | `Migrate` |
//! | any other 4xx | `Fail` |
//! | redirect cap exceeded | `Fail` |
//!
//! The attempt bound is enforced by the caller.

use crate::config::ApiEndpoint;
use crate::transport::TransportError;
use std::time::Duration;

/// What one attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The request never got a status back
    Connection,
    /// The redirect cap was hit
    RedirectLimit,
    /// A non-success status
    Status(u16),
}

impl From<&TransportError> for AttemptOutcome {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::TooManyRedirects => AttemptOutcome::RedirectLimit,
            TransportError::Connection(_) | TransportError::Timeout => AttemptOutcome::Connection,
        }
    }
}

/// Action after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try the same request again
    Retry,
    /// Force `Accept: application/json`, then try again
    RetryAcceptJson,
    /// Switch to the secondary endpoint, then try again
    Migrate,
    /// Give up and surface the error
    Fail,
}

/// Apply the decision table
pub fn decide(outcome: AttemptOutcome, state: &EndpointState) -> RetryDecision {
    match outcome {
        AttemptOutcome::Connection => RetryDecision::Retry,
        AttemptOutcome::Status(code) if (500..600).contains(&code) => RetryDecision::Retry,
        AttemptOutcome::Status(406) => RetryDecision::RetryAcceptJson,
        AttemptOutcome::Status(403) if state.can_migrate() => RetryDecision::Migrate,
        AttemptOutcome::Status(_) => RetryDecision::Fail,
        AttemptOutcome::RedirectLimit => RetryDecision::Fail,
    }
}

/// Attempt bound and pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, first included
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// True if another attempt is allowed after `attempt` (1-based)
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Primary,
    Secondary,
}

/// Which deployment the client is talking to
///
/// Shared between clones of one client behind a mutex. Migration is one-way:
/// once on the secondary, the client stays there.
#[derive(Debug, Clone)]
pub struct EndpointState {
    primary: ApiEndpoint,
    secondary: Option<ApiEndpoint>,
    active: Active,
}

impl EndpointState {
    /// Start on the primary
    pub fn new(primary: ApiEndpoint, secondary: Option<ApiEndpoint>) -> Self {
        EndpointState {
            primary,
            secondary,
            active: Active::Primary,
        }
    }

    /// Deployment in use
    pub fn current(&self) -> &ApiEndpoint {
        match (self.active, &self.secondary) {
            (Active::Secondary, Some(secondary)) => secondary,
            _ => &self.primary,
        }
    }

    /// True until a migration happened
    pub fn on_primary(&self) -> bool {
        self.active == Active::Primary
    }

    /// True if a 403 would trigger a switch
    pub fn can_migrate(&self) -> bool {
        self.on_primary() && self.secondary.is_some()
    }

    /// Switch to the secondary; returns false if that was not possible
    pub fn migrate(&mut self) -> bool {
        if !self.can_migrate() {
            return false;
        }
        self.active = Active::Secondary;
        true
    }
}
