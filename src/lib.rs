//! Susi Rust Client
//!
//! An HTTP client for the Susi publish/subscribe event server: session
//! management over `/auth/*` and event pub/sub over `/events/*`. Events are
//! pulled by polling and dispatched to locally registered handlers.
//!
//! # Example
//!
//! ```no_run
//! use susi_client::{SusiClient, SusiConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SusiClient::new(SusiConfig::new("http://localhost:8080"))?;
//!
//!     client.auth().login("admin", "secret").await?;
//!
//!     // Handlers under "*" see every event
//!     client.events().subscribe("*", |evt| {
//!         println!("{}: {}", evt.topic, evt.payload);
//!     }).await?;
//!
//!     client.events().publish("foo", &serde_json::json!({"this": "is it"})).await?;
//!
//!     // Polling cadence is up to the caller
//!     let n = client.events().get().await?;
//!     println!("dispatched {} events", n);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
mod client;
mod config;
mod error;
pub mod events;
pub mod messages;
pub mod transport;

pub use auth::AuthClient;
pub use client::SusiClient;
pub use config::SusiConfig;
pub use error::{Result, SusiError};
pub use events::{is_glob, EventClient, EventHandler, SubscriptionRegistry, WILDCARD};
pub use messages::{Event, PublishMessage, SessionInfo};
pub use transport::{log_reply, Reply, ReplyCallback, Transport};
