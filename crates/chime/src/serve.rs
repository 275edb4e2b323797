// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chime serve` and `chime drain` command implementations.
//!
//! Serve opens the SQLite store, builds the Expo push transport, and drains
//! the outbox on a fixed interval until interrupted. Drain runs a single
//! batch and exits, for cron-style scheduling.

use std::sync::Arc;
use std::time::Duration;

use chime_config::model::ChimeConfig;
use chime_core::ChimeError;
use chime_outbox::OutboxProcessor;
use chime_push::ExpoPush;
use chime_storage::SqliteStorage;
use tracing::{debug, info, warn};

/// Runs the `chime serve` command.
///
/// Drains one batch every `service.drain_interval_secs`, starting
/// immediately. Ctrl-C stops the loop after the in-flight batch finishes,
/// so no send is abandoned mid-request.
pub async fn run_serve(config: ChimeConfig) -> Result<(), ChimeError> {
    init_tracing(&config.service.log_level);

    info!(
        interval_secs = config.service.drain_interval_secs,
        batch_limit = config.outbox.batch_limit,
        "starting chime serve"
    );

    let (storage, processor) = build_processor(&config).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.service.drain_interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = processor.drain_batch(config.outbox.batch_limit).await;
                debug!(
                    delivered = summary.delivered,
                    retried = summary.retried,
                    dropped = summary.dropped,
                    "drain tick complete"
                );
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "ctrl-c handler failed, shutting down");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    storage.close().await?;
    info!("chime serve stopped");
    Ok(())
}

/// Runs the `chime drain` command: a single batch, then exit.
pub async fn run_drain_once(config: ChimeConfig, limit: Option<i64>) -> Result<(), ChimeError> {
    init_tracing(&config.service.log_level);

    let limit = resolve_limit(limit, config.outbox.batch_limit)?;
    let (storage, processor) = build_processor(&config).await?;
    let summary = processor.drain_batch(limit).await;

    println!(
        "drained: {} delivered, {} retried, {} dropped",
        summary.delivered, summary.retried, summary.dropped
    );

    storage.close().await?;
    Ok(())
}

/// Resolves the drain batch limit from the CLI override.
///
/// SQLite treats a negative LIMIT as unlimited, so a non-positive override
/// is rejected here instead of silently draining the whole table.
fn resolve_limit(limit: Option<i64>, default: i64) -> Result<i64, ChimeError> {
    match limit {
        Some(limit) if limit <= 0 => Err(ChimeError::Config(format!(
            "--limit must be positive, got {limit}"
        ))),
        Some(limit) => Ok(limit),
        None => Ok(default),
    }
}

async fn build_processor(
    config: &ChimeConfig,
) -> Result<(Arc<SqliteStorage>, OutboxProcessor), ChimeError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let transport = Arc::new(ExpoPush::new(&config.push)?);
    let processor = OutboxProcessor::with_max_attempts(
        storage.clone(),
        transport,
        config.outbox.max_attempts,
    );
    Ok((storage, processor))
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to
/// chime crates and `warn` to everything else.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chime={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_limit_defaults_to_configured_batch_limit() {
        assert_eq!(resolve_limit(None, 50).unwrap(), 50);
        assert_eq!(resolve_limit(Some(7), 50).unwrap(), 7);
    }

    #[test]
    fn non_positive_drain_limit_is_rejected() {
        assert!(matches!(resolve_limit(Some(0), 50), Err(ChimeError::Config(_))));
        assert!(matches!(resolve_limit(Some(-1), 50), Err(ChimeError::Config(_))));
    }
}
