// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chime - push-notification delivery with an outbox and incoming-call signal.
//!
//! This is the binary entry point for the Chime service.

use clap::{Parser, Subcommand};

mod notify;
mod serve;
mod status;

/// Chime - push-notification delivery service.
#[derive(Parser, Debug)]
#[command(name = "chime", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the delivery service: drains the outbox on an interval.
    Serve,
    /// Drain one batch of pending outbox rows and exit.
    Drain {
        /// Maximum rows to drain; defaults to the configured batch limit.
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show outbox depth broken down by outcome.
    Status {
        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Record a notification and queue its push delivery.
    Notify {
        /// Recipient user id.
        recipient: String,
        /// Notification kind, e.g. `message` or `voice_call`.
        #[arg(long, default_value = "message")]
        kind: String,
        /// Acting user id (the caller, sender, follower).
        #[arg(long)]
        actor: String,
        /// Push title.
        #[arg(long)]
        title: String,
        /// Push body.
        #[arg(long)]
        body: String,
        /// Extra payload as a JSON object, e.g. `{"conversation_id":"c1"}`.
        #[arg(long)]
        data: Option<String>,
    },
    /// Register or replace a user's push token.
    RegisterToken {
        /// User id owning the token.
        user_id: String,
        /// Expo push token.
        token: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match chime_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            chime_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Drain { limit } => serve::run_drain_once(config, limit).await,
        Commands::Status { json } => status::run_status(&config, json).await,
        Commands::Notify {
            recipient,
            kind,
            actor,
            title,
            body,
            data,
        } => {
            notify::run_notify(
                &config,
                notify::NotifyArgs {
                    recipient,
                    kind,
                    actor,
                    title,
                    body,
                    data,
                },
            )
            .await
        }
        Commands::RegisterToken { user_id, token } => {
            notify::run_register_token(&config, &user_id, &token).await
        }
    };

    if let Err(e) = result {
        eprintln!("chime: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn drain_accepts_optional_limit() {
        let cli = Cli::parse_from(["chime", "drain", "--limit", "10"]);
        match cli.command {
            Commands::Drain { limit } => assert_eq!(limit, Some(10)),
            other => panic!("expected drain, got {other:?}"),
        }

        let cli = Cli::parse_from(["chime", "drain"]);
        match cli.command {
            Commands::Drain { limit } => assert_eq!(limit, None),
            other => panic!("expected drain, got {other:?}"),
        }
    }

    #[test]
    fn notify_parses_full_argument_set() {
        let cli = Cli::parse_from([
            "chime",
            "notify",
            "u1",
            "--kind",
            "voice_call",
            "--actor",
            "u2",
            "--title",
            "Incoming call",
            "--body",
            "u2 is calling you",
            "--data",
            r#"{"conversation_id":"c1"}"#,
        ]);
        match cli.command {
            Commands::Notify {
                recipient,
                kind,
                actor,
                ..
            } => {
                assert_eq!(recipient, "u1");
                assert_eq!(kind, "voice_call");
                assert_eq!(actor, "u2");
            }
            other => panic!("expected notify, got {other:?}"),
        }
    }

    #[test]
    fn notify_kind_defaults_to_message() {
        let cli = Cli::parse_from([
            "chime", "notify", "u1", "--actor", "u2", "--title", "t", "--body", "b",
        ]);
        match cli.command {
            Commands::Notify { kind, .. } => assert_eq!(kind, "message"),
            other => panic!("expected notify, got {other:?}"),
        }
    }
}
