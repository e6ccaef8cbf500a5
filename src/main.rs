//! Susi CLI entry point

mod cli;

use crate::cli::controller::{self, LogController};
use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use susi_client::{PublishMessage, SusiClient};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let client = SusiClient::new(cli.config()).context("Failed to create client")?;

    if !matches!(cli.command, Commands::Login { .. }) {
        if let Some((username, password)) = cli.credentials() {
            client
                .auth()
                .login(username, password)
                .await
                .context("Login failed")?;
        }
    }

    match cli.command {
        Commands::Login { user, pass } => login(&client, &user, &pass).await,
        Commands::Logout => {
            client.auth().logout().await.context("Logout failed")?;
            Ok(())
        }
        Commands::Info => {
            let body = client.auth().info().await.context("Info request failed")?;
            println!("{}", body.trim_end());
            Ok(())
        }
        Commands::Publish {
            topic,
            payload,
            authlevel,
            returnaddr,
        } => publish(&client, topic, payload, authlevel, returnaddr).await,
        Commands::Listen {
            topics,
            authlevel,
            poll_interval_ms,
            keepalive_secs,
        } => {
            listen(
                &client,
                &topics,
                authlevel,
                Duration::from_millis(poll_interval_ms),
                Duration::from_secs(keepalive_secs),
            )
            .await
        }
        Commands::Demo => demo(&client).await,
    }
}

async fn login(client: &SusiClient, username: &str, password: &str) -> Result<()> {
    client
        .auth()
        .login(username, password)
        .await
        .with_context(|| format!("Login as {} failed", username))?;

    let session = client
        .auth()
        .session()
        .await
        .context("Failed to read session")?;

    println!("User: {}", session.user);
    println!("Authlevel: {}", session.authlevel);
    println!("Valid until: {}", session.validuntil);
    Ok(())
}

async fn publish(
    client: &SusiClient,
    topic: String,
    payload: serde_json::Value,
    authlevel: u8,
    returnaddr: Option<String>,
) -> Result<()> {
    let mut msg = PublishMessage::new(topic, payload).authlevel(authlevel);
    if let Some(addr) = returnaddr {
        msg = msg.returnaddr(addr);
    }

    client
        .events()
        .publish_message(&msg)
        .await
        .with_context(|| format!("Failed to publish to {}", msg.key))?;

    println!("Published to {}", msg.key);
    Ok(())
}

async fn listen(
    client: &SusiClient,
    topics: &[String],
    authlevel: u8,
    poll_every: Duration,
    keepalive_every: Duration,
) -> Result<()> {
    if poll_every.is_zero() || keepalive_every.is_zero() {
        anyhow::bail!("Poll and keepalive intervals must be greater than zero");
    }

    for topic in topics {
        LogController::init(client.events(), topic, authlevel).await;
    }

    info!(url = %client.config().url, topics = ?topics, "Listening for events");
    controller::run(client, poll_every, keepalive_every, shutdown_signal()).await;
    Ok(())
}

/// The sample controller: log everything, publish one event, poll.
async fn demo(client: &SusiClient) -> Result<()> {
    LogController::init(client.events(), "*", 0).await;

    if let Err(e) = client
        .events()
        .publish("foo", &serde_json::json!({"this": "is it"}))
        .await
    {
        warn!(error = %e, "Publish failed");
    }

    let n = client.events().get().await.context("Poll failed")?;
    info!(events = n, "Demo finished");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
