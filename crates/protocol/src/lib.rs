//! Protocol layer for swhdag
//!
//! Everything between a typed call and the archive's HTTP API:
//! - Endpoint: the static endpoint table and argument validation
//! - ProtocolClient: retrying client with primary/secondary migration
//! - Response: decoded bodies and shape normalization
//! - Transport: the HTTP seam (`ureq` in production, scripted in tests)
//! - logging: optional `tracing-subscriber` setup

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod response;
pub mod retry;
pub mod testing;
pub mod transport;

pub use client::ProtocolClient;
pub use config::{ApiEndpoint, ClientConfig, ConfigError, API_PREFIX, DEFAULT_API_URL};
pub use endpoint::{ArgKind, Endpoint, EndpointArg, Method};
pub use error::{ProtocolError, Result};
pub use logging::{init_logging, LogConfig, LoggingError};
pub use response::{Response, ResponseShape, Shaped};
pub use retry::{EndpointState, RetryDecision, RetryPolicy};
pub use transport::{Headers, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
