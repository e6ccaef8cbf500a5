//! Event pub/sub over `/events/*`
//!
//! Subscriptions live in two places: the server tracks topic interest per
//! session and queues matching events, while the client keeps a
//! [`SubscriptionRegistry`] mapping topics to local handlers. Polling with
//! [`EventClient::get`] drains the server queue and dispatches each event
//! through the registry.
//!
//! Dispatch order is reversed on both axes: the batch is walked from the
//! last event to the first, and for each event the most recently
//! registered handler runs first.
//!
//! A subscription key containing `*`, `?` or `[` is a glob pattern, matched
//! against the event topic the same way the server matches it when queueing
//! events (`*` does not cross `/`). Handlers under [`WILDCARD`] receive
//! every event, slashes included. A topic's own handlers run before any glob handlers,
//! and glob keys run newest key first. Each key is considered once per event,
//! so a glob key equal to the topic does not deliver twice.

use crate::error::Result;
use crate::messages::{parse_event_batch, Event, PublishMessage, SubscribeMessage};
use crate::transport::Transport;

use globset::{GlobBuilder, GlobMatcher};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub const PUBLISH_PATH: &str = "/events/publish";
pub const SUBSCRIBE_PATH: &str = "/events/subscribe";
pub const GET_PATH: &str = "/events/get";

/// Topic whose handlers receive every event
pub const WILDCARD: &str = "*";

/// Handler for incoming events
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Whether a subscription key is treated as a glob pattern
pub fn is_glob(key: &str) -> bool {
    key.contains(['*', '?', '['])
}

fn compile_pattern(key: &str) -> Option<GlobMatcher> {
    if !is_glob(key) {
        return None;
    }

    match GlobBuilder::new(key).literal_separator(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!(key, error = %e, "Invalid glob pattern, matching it literally");
            None
        }
    }
}

struct Subscription {
    /// Registration order of the key itself
    seq: usize,
    pattern: Option<GlobMatcher>,
    handlers: Vec<EventHandler>,
}

/// Topic to handler-list mapping.
///
/// Handlers are kept in registration order and never removed. Registering
/// the same handler twice makes it run twice per event.
#[derive(Default)]
pub struct SubscriptionRegistry {
    topics: Mutex<HashMap<String, Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to a topic, creating the entry if needed
    pub fn register(&self, topic: &str, handler: EventHandler) {
        let mut topics = self.topics.lock();
        let seq = topics.len();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| Subscription {
                seq,
                pattern: compile_pattern(topic),
                handlers: Vec::new(),
            })
            .handlers
            .push(handler);
    }

    /// Number of handlers registered for exactly this key
    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, |s| s.handlers.len())
    }

    /// Whether any handler is registered for exactly this key
    pub fn is_registered(&self, topic: &str) -> bool {
        self.handler_count(topic) > 0
    }

    /// All keys with at least one handler
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Handlers for `topic` in the order they will run: the topic's own
    /// handlers newest first, then matching glob handlers, newest key first
    /// and newest handler first within a key.
    ///
    /// Returned as a snapshot so handlers may register more handlers
    /// while a dispatch is running.
    fn dispatch_order(&self, topic: &str) -> Vec<EventHandler> {
        let topics = self.topics.lock();
        let mut handlers: Vec<EventHandler> = topics
            .get(topic)
            .map(|s| s.handlers.iter().rev().cloned().collect())
            .unwrap_or_default();

        let mut globs: Vec<&Subscription> = topics
            .iter()
            .filter(|(key, sub)| {
                key.as_str() != topic
                    && (key.as_str() == WILDCARD
                        || sub.pattern.as_ref().is_some_and(|p| p.is_match(topic)))
            })
            .map(|(_, sub)| sub)
            .collect();
        globs.sort_by(|a, b| b.seq.cmp(&a.seq));

        for sub in globs {
            handlers.extend(sub.handlers.iter().rev().cloned());
        }

        handlers
    }

    /// Deliver a batch to matching handlers, last event first.
    ///
    /// Returns the number of handler invocations.
    pub fn dispatch(&self, batch: &[Event]) -> usize {
        let mut invoked = 0;

        for event in batch.iter().rev() {
            let handlers = self.dispatch_order(&event.topic);
            if handlers.is_empty() {
                debug!(topic = %event.topic, "No handlers for event");
                continue;
            }
            for handler in &handlers {
                handler(event);
            }
            invoked += handlers.len();
        }

        invoked
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.lock();
        let mut map = f.debug_map();
        for (topic, sub) in topics.iter() {
            map.entry(topic, &sub.handlers.len());
        }
        map.finish()
    }
}

/// Publish, subscribe and poll for events.
///
/// Cloning is cheap; clones share the same registry and transport.
#[derive(Debug, Clone)]
pub struct EventClient {
    transport: Transport,
    registry: Arc<SubscriptionRegistry>,
}

impl EventClient {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            registry: Arc::new(SubscriptionRegistry::new()),
        }
    }

    /// The local subscription registry
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Publish `payload` under `topic` with authlevel 0 and no return address
    pub async fn publish<T>(&self, topic: &str, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        self.publish_message(&PublishMessage::new(topic, payload))
            .await
    }

    /// Publish a fully specified envelope
    pub async fn publish_message(&self, msg: &PublishMessage) -> Result<()> {
        self.transport
            .post_logged(PUBLISH_PATH, Some(msg))
            .await
            .map(|_| ())
    }

    /// Subscribe to `topic` with authlevel 0.
    ///
    /// See [`EventClient::subscribe_with_authlevel`].
    pub fn subscribe<F>(
        &self,
        topic: &str,
        handler: F,
    ) -> impl Future<Output = Result<()>> + Send + 'static
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_with_authlevel(topic, 0, handler)
    }

    /// Subscribe to `topic`.
    ///
    /// The handler is registered locally before this returns, whether or
    /// not the returned future is awaited. The future registers interest
    /// with the server; if that fails the error is returned but the local
    /// handler stays, so it still fires for matching events fetched later.
    pub fn subscribe_with_authlevel<F>(
        &self,
        topic: &str,
        authlevel: u8,
        handler: F,
    ) -> impl Future<Output = Result<()>> + Send + 'static
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registry.register(topic, Arc::new(handler));
        debug!(topic, authlevel, "Registered handler");

        let transport = self.transport.clone();
        let msg = SubscribeMessage {
            key: topic.to_string(),
            authlevel,
        };

        async move {
            transport
                .post_logged(SUBSCRIBE_PATH, Some(&msg))
                .await
                .map(|_| ())
        }
    }

    /// Fetch pending events and dispatch them to registered handlers.
    ///
    /// Returns the number of events in the fetched batch. A body that is
    /// not a JSON array of events (or `null`) is an error and nothing is
    /// dispatched.
    pub async fn get(&self) -> Result<usize> {
        let reply = match self.transport.post_empty(GET_PATH).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Failed to fetch events");
                return Err(e);
            }
        };

        let batch = parse_event_batch(&reply.body)?;
        let invoked = self.registry.dispatch(&batch);
        debug!(events = batch.len(), invoked, "Dispatched events");

        Ok(batch.len())
    }
}
