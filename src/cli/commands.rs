//! CLI command definitions

use clap::{Parser, Subcommand};
use std::time::Duration;
use susi_client::SusiConfig;

#[derive(Parser)]
#[command(name = "susi")]
#[command(about = "Client for the Susi event server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL
    #[arg(long, env = "SUSI_URL", global = true, default_value = "http://localhost:8080")]
    pub url: String,

    /// Request timeout in milliseconds (requests wait forever if unset)
    #[arg(long, env = "SUSI_REQUEST_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, env = "SUSI_INSECURE", global = true)]
    pub insecure: bool,

    /// Log in as this user before running the command
    #[arg(long, env = "SUSI_USERNAME", global = true, requires = "password")]
    pub username: Option<String>,

    /// Password for --username
    #[arg(long, env = "SUSI_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,
}

impl Cli {
    pub fn config(&self) -> SusiConfig {
        let mut config = SusiConfig::new(&self.url);
        if let Some(ms) = self.timeout_ms {
            config = config.request_timeout(Duration::from_millis(ms));
        }
        if self.insecure {
            config = config.dangerous_accept_invalid_certs();
        }
        config
    }

    /// Credentials given through the global flags
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

/// Every invocation is a fresh server session; state does not carry over
/// between commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print the resulting session
    Login {
        #[arg(value_name = "USERNAME")]
        user: String,

        #[arg(value_name = "PASSWORD")]
        pass: String,
    },

    /// End the current session
    Logout,

    /// Print the session description
    Info,

    /// Publish an event
    ///
    /// Examples:
    ///   susi publish foo '{"this": "is it"}'
    ///   susi publish calc::add '[1, 2]' --returnaddr calc::result --authlevel 1
    Publish {
        /// Topic to publish under
        topic: String,

        /// Payload as JSON; anything that is not valid JSON is sent as a string
        #[arg(value_parser = parse_payload, default_value = "null")]
        payload: serde_json::Value,

        /// Authlevel attached to the event
        #[arg(long, default_value_t = 0)]
        authlevel: u8,

        /// Topic the server should route replies to
        #[arg(long)]
        returnaddr: Option<String>,
    },

    /// Subscribe and log incoming events until interrupted
    Listen {
        /// Topic to subscribe to, "*" for everything (can be repeated)
        #[arg(short, long = "topic", default_value = "*")]
        topics: Vec<String>,

        /// Authlevel attached to the subscriptions
        #[arg(long, default_value_t = 0)]
        authlevel: u8,

        /// Milliseconds between polls
        #[arg(long, default_value_t = 1000)]
        poll_interval_ms: u64,

        /// Seconds between session keepalives
        #[arg(long, default_value_t = 60)]
        keepalive_secs: u64,
    },

    /// Run the sample controller once: subscribe to "*", publish, poll
    Demo,
}

fn parse_payload(s: &str) -> Result<serde_json::Value, String> {
    Ok(serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload_json() {
        assert_eq!(parse_payload(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_payload("42").unwrap(), json!(42));
    }

    #[test]
    fn test_parse_payload_plain_string() {
        assert_eq!(parse_payload("hello world").unwrap(), json!("hello world"));
    }

    #[test]
    fn test_cli_publish_args() {
        let cli = Cli::try_parse_from([
            "susi",
            "--url",
            "http://susi.local:8080",
            "publish",
            "foo",
            r#"{"this":"is it"}"#,
            "--returnaddr",
            "bar",
        ])
        .unwrap();

        assert_eq!(cli.config().url, "http://susi.local:8080");
        match cli.command {
            Commands::Publish {
                topic,
                payload,
                authlevel,
                returnaddr,
            } => {
                assert_eq!(topic, "foo");
                assert_eq!(payload, json!({"this": "is it"}));
                assert_eq!(authlevel, 0);
                assert_eq!(returnaddr.as_deref(), Some("bar"));
            }
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn test_cli_listen_defaults() {
        let cli = Cli::try_parse_from(["susi", "--url", "http://localhost:1", "listen"]).unwrap();
        match cli.command {
            Commands::Listen {
                topics,
                authlevel,
                poll_interval_ms,
                keepalive_secs,
            } => {
                assert_eq!(topics, vec!["*"]);
                assert_eq!(authlevel, 0);
                assert_eq!(poll_interval_ms, 1000);
                assert_eq!(keepalive_secs, 60);
            }
            _ => panic!("expected listen"),
        }
    }

    #[test]
    fn test_cli_timeout_into_config() {
        let cli = Cli::try_parse_from([
            "susi",
            "--url",
            "http://localhost:1",
            "--timeout-ms",
            "250",
            "info",
        ])
        .unwrap();
        assert_eq!(cli.config().request_timeout, Some(Duration::from_millis(250)));
    }

    // The only test in this binary that touches SUSI_* variables; every
    // other test passes --url explicitly.
    #[test]
    fn test_cli_config_from_env() {
        std::env::set_var("SUSI_URL", "http://10.0.0.1:4000/");
        std::env::set_var("SUSI_REQUEST_TIMEOUT_MS", "1500");
        std::env::set_var("SUSI_INSECURE", "true");

        let parsed = Cli::try_parse_from(["susi", "info"]);

        std::env::remove_var("SUSI_URL");
        std::env::remove_var("SUSI_REQUEST_TIMEOUT_MS");
        std::env::remove_var("SUSI_INSECURE");

        let config = parsed.unwrap().config();
        assert_eq!(config.url, "http://10.0.0.1:4000");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
        assert!(config.dangerous_accept_invalid_certs);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_login_args() {
        let cli =
            Cli::try_parse_from(["susi", "--url", "http://localhost:1", "login", "alice", "pw"])
                .unwrap();
        match cli.command {
            Commands::Login { user, pass } => {
                assert_eq!(user, "alice");
                assert_eq!(pass, "pw");
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_cli_credentials() {
        let cli = Cli::try_parse_from([
            "susi",
            "--url",
            "http://localhost:1",
            "--username",
            "u",
            "--password",
            "p",
            "info",
        ])
        .unwrap();
        assert_eq!(cli.credentials(), Some(("u", "p")));
    }
}
