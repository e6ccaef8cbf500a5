//! Error types for the Susi client

use thiserror::Error;

/// Errors that can occur when talking to a Susi server
#[derive(Error, Debug)]
pub enum SusiError {
    /// The request never produced a response (connect, TLS, body read, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something other than 200
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to serialize a request or deserialize a response
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured server URL cannot be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SusiError {
    /// HTTP status reported for this failure.
    ///
    /// Failures without a response report 0, the same value a browser
    /// `XMLHttpRequest` exposes for network errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            SusiError::Status { status, .. } => Some(*status),
            SusiError::Http(e) => Some(e.status().map_or(0, |s| s.as_u16())),
            _ => None,
        }
    }

    /// Raw response body, if the server sent one
    pub fn body(&self) -> Option<&str> {
        match self {
            SusiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type for Susi operations
pub type Result<T> = std::result::Result<T, SusiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_status() {
        let err = SusiError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status 401: unauthorized");
    }

    #[test]
    fn test_error_display_invalid_url() {
        let err = SusiError::InvalidUrl("not a url".to_string());
        assert_eq!(err.to_string(), "Invalid URL: not a url");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err: SusiError = json_err.into();
        assert!(matches!(err, SusiError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_status_and_body_accessors() {
        let err = SusiError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some("boom"));
    }

    #[test]
    fn test_invalid_url_has_no_status() {
        let err = SusiError::InvalidUrl("bad".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_error_debug() {
        let err = SusiError::Status {
            status: 404,
            body: "missing".to_string(),
        };
        let debug = format!("{:?}", err);
        assert!(debug.contains("Status"));
        assert!(debug.contains("missing"));
    }
}
