//! Susi client facade

use crate::auth::AuthClient;
use crate::config::SusiConfig;
use crate::error::Result;
use crate::events::EventClient;
use crate::transport::Transport;

/// Susi HTTP client
///
/// Owns one [`Transport`] and the auth and event clients built on it, so
/// all calls share one connection pool, one cookie jar (and with it one
/// server session), and one subscription registry. This struct is cheaply
/// cloneable.
#[derive(Debug, Clone)]
pub struct SusiClient {
    config: SusiConfig,
    transport: Transport,
    auth: AuthClient,
    events: EventClient,
}

impl SusiClient {
    /// Create a new client with the given configuration
    pub fn new(config: SusiConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client around an existing transport
    pub fn with_transport(config: SusiConfig, transport: Transport) -> Self {
        Self {
            auth: AuthClient::new(transport.clone()),
            events: EventClient::new(transport.clone()),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &SusiConfig {
        &self.config
    }

    /// Raw transport, for endpoints without a named wrapper
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Login, logout, keepalive and session info
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Publish, subscribe and poll
    pub fn events(&self) -> &EventClient {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SusiError;

    #[test]
    fn test_client_new() {
        let client = SusiClient::new(SusiConfig::new("http://localhost:8080")).unwrap();
        assert_eq!(client.config().url, "http://localhost:8080");
        assert_eq!(client.transport().base_url(), "http://localhost:8080");
        assert!(client.events().registry().topics().is_empty());
    }

    #[test]
    fn test_client_rejects_bad_url() {
        let result = SusiClient::new(SusiConfig::new("localhost without scheme"));
        assert!(matches!(result, Err(SusiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let client = SusiClient::new(SusiConfig::new("http://127.0.0.1:9")).unwrap();
        let clone = client.clone();

        drop(clone.events().subscribe("foo", |_evt| {}));

        assert_eq!(client.events().registry().handler_count("foo"), 1);
    }
}
