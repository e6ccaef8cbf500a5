//! Sample controller
//!
//! Subscribes to topics, logs what arrives, and drives polling and
//! session keepalive on timers. The library itself never polls on its own.

use std::future::Future;
use std::time::Duration;
use susi_client::{Event, EventClient, SusiClient};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Logs every event delivered to it
pub struct LogController;

impl LogController {
    /// Subscribe the logging handler to `topic`.
    ///
    /// A failed server registration is only logged; the local handler stays.
    pub async fn init(events: &EventClient, topic: &str, authlevel: u8) {
        if let Err(e) = events
            .subscribe_with_authlevel(topic, authlevel, Self::log_event)
            .await
        {
            warn!(topic, error = %e, "Server did not accept subscription");
        }
    }

    pub fn log_event(evt: &Event) {
        info!("{}", Self::format_event(evt));
    }

    fn format_event(evt: &Event) -> String {
        format!(
            "Logging: {} : {}",
            serde_json::Value::from(evt.topic.as_str()),
            evt.payload
        )
    }
}

/// Poll for events and send keepalives until `shutdown` resolves.
///
/// The first poll happens immediately, the first keepalive after one full
/// keepalive period. Failed calls are logged and the loop carries on.
pub async fn run(
    client: &SusiClient,
    poll_every: Duration,
    keepalive_every: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut poll = interval(poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut keepalive = interval(keepalive_every);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    keepalive.tick().await;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match client.events().get().await {
                    Ok(0) => {}
                    Ok(n) => debug!(events = n, "Polled events"),
                    Err(e) => warn!(error = %e, "Poll failed"),
                }
            }
            _ = keepalive.tick() => {
                if let Err(e) = client.auth().keep_alive().await {
                    warn!(error = %e, "Keepalive failed");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping");
                break;
            }
        }
    }
}
