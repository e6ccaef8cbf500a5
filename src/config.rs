//! Configuration for the Susi client

use std::time::Duration;

/// Configuration for connecting to a Susi server
#[derive(Debug, Clone)]
pub struct SusiConfig {
    /// Server base URL (e.g., "http://localhost:8080"), without trailing slash
    pub url: String,

    /// Per-request timeout. `None` lets a hung request wait forever.
    pub request_timeout: Option<Duration>,

    /// Accept invalid TLS certificates (for development)
    pub dangerous_accept_invalid_certs: bool,
}

impl SusiConfig {
    /// Create a new configuration for the given server URL
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            url,
            request_timeout: None,
            dangerous_accept_invalid_certs: false,
        }
    }

    /// Set a per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Accept invalid TLS certificates (DANGEROUS - only for development)
    pub fn dangerous_accept_invalid_certs(mut self) -> Self {
        self.dangerous_accept_invalid_certs = true;
        self
    }
}
