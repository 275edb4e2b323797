// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chime status` command implementation.
//!
//! Reads outbox depth straight from the configured database. Safe to run
//! alongside a live serve process; reads never block the drain loop.

use chime_config::model::ChimeConfig;
use chime_core::{ChimeError, NotificationStore};
use chime_storage::SqliteStorage;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub pending: i64,
    pub delivered: i64,
    pub dropped: i64,
}

/// Runs the `chime status` command.
pub async fn run_status(config: &ChimeConfig, json: bool) -> Result<(), ChimeError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let counts = storage.outbox_counts(config.outbox.max_attempts).await?;
    storage.close().await?;

    if json {
        let response = StatusResponse {
            database_path: config.storage.database_path.clone(),
            pending: counts.pending,
            delivered: counts.delivered,
            dropped: counts.dropped,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("outbox ({})", config.storage.database_path);
        println!("  pending:   {}", counts.pending);
        println!("  delivered: {}", counts.delivered);
        println!("  dropped:   {}", counts.dropped);
    }

    Ok(())
}
