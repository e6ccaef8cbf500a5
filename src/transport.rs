//! HTTP transport
//!
//! Every Susi operation is a single JSON `POST` to a fixed path. A response
//! with status exactly 200 is a success; every other outcome, including a
//! request that never got a response, is a failure carrying only a status
//! code and the raw body.

use crate::config::SusiConfig;
use crate::error::{Result, SusiError};

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Callback receiving a response body and its status code
pub type ReplyCallback = Box<dyn FnOnce(String, u16) + Send + 'static>;

/// A successful (status 200) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

/// POST-only HTTP transport bound to one server.
///
/// Cloning is cheap and clones share the connection pool and cookie jar,
/// so the session cookie the server hands out follows every clone.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Build a transport from configuration
    pub fn new(config: &SusiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if config.dangerous_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Self::with_client(builder.build()?, &config.url)
    }

    /// Build a transport around a pre-configured HTTP client
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        reqwest::Url::parse(base_url)
            .map_err(|e| SusiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// POST `payload` as JSON to `path`.
    ///
    /// `None` sends an empty body. Resolves to `Ok` only for status 200.
    pub async fn post<T>(&self, path: &str, payload: Option<&T>) -> Result<Reply>
    where
        T: Serialize + ?Sized,
    {
        let body = encode(payload)?;
        self.post_raw(path, body).await
    }

    /// POST with an empty body
    pub async fn post_empty(&self, path: &str) -> Result<Reply> {
        self.post_raw(path, None).await
    }

    /// Like [`Transport::post`], but also writes the outcome to the log
    /// the way [`log_reply`] does.
    pub async fn post_logged<T>(&self, path: &str, payload: Option<&T>) -> Result<Reply>
    where
        T: Serialize + ?Sized,
    {
        let result = self.post(path, payload).await;
        match &result {
            Ok(reply) => log_body(&reply.body, reply.status),
            Err(SusiError::Status { status, body }) => log_body(body, *status),
            Err(e) => warn!(path, error = %e, "Request failed"),
        }
        result
    }

    /// Fire-and-forget POST with completion callbacks.
    ///
    /// Returns as soon as the request is spawned. Once it completes exactly
    /// one of `on_success(body, 200)` or `on_error(body, status)` runs, once.
    /// A request that got no response, or a payload that failed to
    /// serialize, reports status 0 and the error text as body. Missing
    /// callbacks default to [`log_reply`]. If the task is aborted or the
    /// runtime shuts down first, neither callback runs.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send<T>(
        &self,
        path: &str,
        payload: Option<&T>,
        on_success: Option<ReplyCallback>,
        on_error: Option<ReplyCallback>,
    ) -> JoinHandle<()>
    where
        T: Serialize + ?Sized,
    {
        let body = encode(payload);
        let on_success: ReplyCallback = on_success.unwrap_or_else(|| Box::new(log_reply));
        let on_error: ReplyCallback = on_error.unwrap_or_else(|| Box::new(log_reply));
        let transport = self.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            let result = match body {
                Ok(body) => transport.post_raw(&path, body).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(reply) => on_success(reply.body, reply.status),
                Err(SusiError::Status { status, body }) => on_error(body, status),
                Err(e) => on_error(e.to_string(), 0),
            }
        })
    }

    async fn post_raw(&self, path: &str, body: Option<Vec<u8>>) -> Result<Reply> {
        let url = self.url(path);
        debug!(%url, "POST");

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK {
            Ok(Reply {
                status: status.as_u16(),
                body,
            })
        } else {
            debug!(%url, status = status.as_u16(), "Request rejected");
            Err(SusiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Default reply handler: writes the body to the log
pub fn log_reply(body: String, status: u16) {
    log_body(&body, status);
}

fn log_body(body: &str, status: u16) {
    if status == 200 {
        info!(status, "{}", body);
    } else {
        warn!(status, "{}", body);
    }
}

fn encode<T>(payload: Option<&T>) -> Result<Option<Vec<u8>>>
where
    T: Serialize + ?Sized,
{
    Ok(payload.map(|p| serde_json::to_vec(p)).transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport(base: &str) -> Transport {
        Transport::with_client(reqwest::Client::new(), base).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let t = transport("http://localhost:8080/");
        assert_eq!(t.base_url(), "http://localhost:8080");
        assert_eq!(t.url("/auth/login"), "http://localhost:8080/auth/login");
        assert_eq!(t.url("events/get"), "http://localhost:8080/events/get");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Transport::with_client(reqwest::Client::new(), "not a url");
        assert!(matches!(result, Err(SusiError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_from_config() {
        let config = SusiConfig::new("http://localhost:8080")
            .request_timeout(std::time::Duration::from_secs(1));
        let t = Transport::new(&config).unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080");
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[tokio::test]
    async fn test_send_reports_encode_failure_to_error_callback() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ok_tx = tx.clone();

        transport("http://127.0.0.1:9")
            .send(
                "/events/publish",
                Some(&Unserializable),
                Some(Box::new(move |body: String, status: u16| {
                    let _ = ok_tx.send(("success", body, status));
                })),
                Some(Box::new(move |body: String, status: u16| {
                    let _ = tx.send(("error", body, status));
                })),
            )
            .await
            .unwrap();

        let (kind, body, status) = rx.recv().await.unwrap();
        assert_eq!(kind, "error");
        assert_eq!(status, 0);
        assert!(body.contains("refused"));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_encode_absent_payload() {
        assert_eq!(encode::<serde_json::Value>(None).unwrap(), None);
    }

    #[test]
    fn test_encode_null_payload() {
        let body = encode(Some(&serde_json::Value::Null)).unwrap();
        assert_eq!(body.as_deref(), Some(&b"null"[..]));
    }

    #[test]
    fn test_encode_object_payload() {
        let body = encode(Some(&json!({"key": "foo"}))).unwrap().unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded, json!({"key": "foo"}));
    }
}
