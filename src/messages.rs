//! Wire types for the Susi HTTP API
//!
//! These mirror the JSON bodies the server's `/auth/*` and `/events/*`
//! handlers decode and encode.

use serde::{Deserialize, Serialize};

/// Body of `/auth/login`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Envelope sent to `/events/publish`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublishMessage {
    /// Topic the event is published under
    pub key: String,
    pub payload: serde_json::Value,
    /// Trust tier; the server raises it to the session's level if lower
    pub authlevel: u8,
    /// Topic the server routes replies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returnaddr: Option<String>,
}

impl PublishMessage {
    /// Create an envelope with authlevel 0 and no return address
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            payload,
            authlevel: 0,
            returnaddr: None,
        }
    }

    /// Set the authlevel
    pub fn authlevel(mut self, authlevel: u8) -> Self {
        self.authlevel = authlevel;
        self
    }

    /// Set the return address
    pub fn returnaddr(mut self, returnaddr: impl Into<String>) -> Self {
        self.returnaddr = Some(returnaddr.into());
        self
    }
}

/// Body of `/events/subscribe`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscribeMessage {
    pub key: String,
    pub authlevel: u8,
}

/// An event delivered by `/events/get`
///
/// Only `topic` is required. The capitalised `Topic` / `Payload` spellings
/// are accepted as aliases.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Event {
    #[serde(default)]
    pub id: u64,

    #[serde(default, rename = "sessionid")]
    pub session_id: u64,

    #[serde(alias = "Topic")]
    pub topic: String,

    #[serde(default)]
    pub authlevel: u8,

    #[serde(default)]
    pub returnaddr: String,

    #[serde(default, alias = "Payload")]
    pub payload: serde_json::Value,

    #[serde(default)]
    pub username: Option<String>,
}

impl Event {
    /// Create an event carrying only a topic and payload
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: 0,
            session_id: 0,
            topic: topic.into(),
            authlevel: 0,
            returnaddr: String::new(),
            payload,
            username: None,
        }
    }

    /// Return address, if the publisher set one
    pub fn return_addr(&self) -> Option<&str> {
        if self.returnaddr.is_empty() {
            None
        } else {
            Some(&self.returnaddr)
        }
    }
}

/// Session description returned by `/auth/info`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub user: String,
    pub authlevel: i64,
    /// Unix timestamp (seconds) after which the server drops the session
    #[serde(default)]
    pub validuntil: i64,
}

/// Decode an `/events/get` body.
///
/// `null`, an empty body, and `[]` all mean "no pending events".
pub fn parse_event_batch(body: &str) -> serde_json::Result<Vec<Event>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let batch: Option<Vec<Event>> = serde_json::from_str(body)?;
    Ok(batch.unwrap_or_default())
}
