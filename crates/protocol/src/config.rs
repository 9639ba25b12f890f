//! Client configuration
//!
//! Defaults mirror the archive's public deployment: five attempts with a
//! five second pause, five second timeouts, and a bound of 1000 pages on
//! any paginated walk.

use std::time::Duration;
use thiserror::Error;

/// Public archive deployment
pub const DEFAULT_API_URL: &str = "https://archive.softwareheritage.org";

/// Path prefix shared by every endpoint route
pub const API_PREFIX: &str = "/api/1/";

/// Default number of attempts per call, first attempt included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Default connect and overall timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on the number of pages any paginated fetch may follow
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Environment variable naming the primary base URL
pub const ENV_PRIMARY_URL: &str = "SWH_API_URL_PROD";
/// Environment variable holding the primary bearer token
pub const ENV_PRIMARY_TOKEN: &str = "SWH_TOKEN_PROD";
/// Environment variable naming the secondary base URL
pub const ENV_SECONDARY_URL: &str = "SWH_API_URL_STAGING";
/// Environment variable holding the secondary bearer token
pub const ENV_SECONDARY_TOKEN: &str = "SWH_TOKEN_STAGING";

/// Configuration errors, raised before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A base URL does not parse or is not http(s)
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// A bound that must be positive is zero
    #[error("'{field}' must be at least 1")]
    ZeroBound {
        /// Field name
        field: &'static str,
    },
}

/// One API deployment: base URL plus optional bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Base URL, e.g. `https://archive.softwareheritage.org`
    pub api_url: String,
    /// Bearer token sent with every request, if any
    pub token: Option<String>,
}

impl ApiEndpoint {
    /// Create an endpoint without a token
    pub fn new(api_url: impl Into<String>) -> Self {
        ApiEndpoint {
            api_url: api_url.into(),
            token: None,
        }
    }

    /// Attach a bearer token; empty tokens are ignored
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Base URL without trailing slashes
    pub fn base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        ApiEndpoint::new(DEFAULT_API_URL)
    }
}

/// Protocol client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deployment used first
    pub primary: ApiEndpoint,
    /// Deployment switched to on a 403 from the primary
    pub secondary: Option<ApiEndpoint>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Overall request timeout
    pub timeout: Duration,
    /// Attempts per call, first attempt included
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    /// Bound on pages followed by any paginated fetch
    pub max_pages: usize,
    /// `User-Agent` header value
    pub user_agent: String,
    /// `Accept` header sent by default
    pub accept: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            primary: ApiEndpoint::default(),
            secondary: None,
            connect_timeout: DEFAULT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
            user_agent: format!("swhdag/{}", env!("CARGO_PKG_VERSION")),
            accept: "application/json".to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults pointed at `api_url`
    pub fn new(api_url: impl Into<String>) -> Self {
        ClientConfig {
            primary: ApiEndpoint::new(api_url),
            ..Default::default()
        }
    }

    /// Read endpoints and tokens from the process environment
    ///
    /// The primary falls back to the public deployment. A secondary is only
    /// configured when its URL variable is set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut primary =
            ApiEndpoint::new(present(ENV_PRIMARY_URL).unwrap_or_else(|| DEFAULT_API_URL.into()));
        if let Some(token) = present(ENV_PRIMARY_TOKEN) {
            primary = primary.with_token(token);
        }

        let secondary = present(ENV_SECONDARY_URL).map(|url| {
            let endpoint = ApiEndpoint::new(url);
            match present(ENV_SECONDARY_TOKEN) {
                Some(token) => endpoint.with_token(token),
                None => endpoint,
            }
        });

        ClientConfig {
            primary,
            secondary,
            ..Default::default()
        }
    }

    /// Set the secondary deployment
    pub fn with_secondary(mut self, secondary: ApiEndpoint) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Set the attempt bound and the pause between attempts
    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = retry_delay;
        self
    }

    /// Set the page bound
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set both timeouts
    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    /// Check URLs and bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.primary.validate()?;
        if let Some(secondary) = &self.secondary {
            secondary.validate()?;
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_attempts",
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroBound { field: "max_pages" });
        }
        Ok(())
    }
}
