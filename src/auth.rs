//! Session calls against `/auth/*`
//!
//! The server is the only authority on login state; the client keeps
//! nothing except the session cookie held by the transport.

use crate::error::Result;
use crate::messages::{LoginRequest, SessionInfo};
use crate::transport::Transport;

use tracing::{info, warn};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const KEEPALIVE_PATH: &str = "/auth/keepalive";
pub const INFO_PATH: &str = "/auth/info";

/// Login, logout, keepalive and session introspection
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: Transport,
}

impl AuthClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Log in with the given credentials.
    ///
    /// Credentials are passed through untouched. The outcome is logged
    /// with the username either way.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.transport.post(LOGIN_PATH, Some(&request)).await {
            Ok(_) => {
                info!("successfully logged in as {}", username);
                Ok(())
            }
            Err(e) => {
                warn!(status = ?e.status(), "failed logging in as {}", username);
                Err(e)
            }
        }
    }

    /// Drop back to the anonymous session
    pub async fn logout(&self) -> Result<()> {
        self.transport
            .post_logged::<()>(LOGOUT_PATH, None)
            .await
            .map(|_| ())
    }

    /// Refresh the session's expiry.
    ///
    /// Sessions expire server-side unless refreshed; call this on a timer.
    pub async fn keep_alive(&self) -> Result<()> {
        self.transport
            .post_logged::<()>(KEEPALIVE_PATH, None)
            .await
            .map(|_| ())
    }

    /// Fetch the raw session description. The body is also logged.
    pub async fn info(&self) -> Result<String> {
        self.transport
            .post_logged::<()>(INFO_PATH, None)
            .await
            .map(|reply| reply.body)
    }

    /// Fetch and decode the session description
    pub async fn session(&self) -> Result<SessionInfo> {
        let reply = self.transport.post_empty(INFO_PATH).await?;
        Ok(serde_json::from_str(&reply.body)?)
    }
}
