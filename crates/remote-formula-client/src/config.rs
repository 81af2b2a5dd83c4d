//! Client configuration.

use std::time::Duration;

/// Default service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8882";

/// Default organization sent as `x-org`.
pub const DEFAULT_ORG: &str = "zup";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, e.g. `https://formulas.example.com`.
    pub base_url: String,
    /// Organization header value.
    pub org: String,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// Create a config for `base_url` with default org and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            org: DEFAULT_ORG.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the organization.
    #[must_use]
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
