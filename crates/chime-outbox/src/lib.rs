// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox processor for the Chime notification service.
//!
//! Drains unprocessed outbox rows in FIFO order and delegates each delivery
//! to a [`PushTransport`]. Guarantees at-least-once delivery bounded by a
//! maximum attempt count: a row is retried on every drain until it either
//! succeeds or runs out of attempts, at which point it is dropped (marked
//! processed without a successful delivery).
//!
//! All failures are caught and logged here; `drain_batch` never propagates
//! an error to its caller, so a scheduled invocation cannot crash.

use std::sync::Arc;

use chime_core::types::{DrainSummary, OutboxEntry};
use chime_core::{ChimeError, NotificationStore, PushTransport};
use tracing::{debug, error, info, warn};

/// Default number of delivery attempts before a row is dropped.
pub const DEFAULT_MAX_ATTEMPTS: i64 = 5;

/// The delivery retry engine.
///
/// Stateless between drains; all state lives in the store. Intended to be
/// invoked periodically by an external scheduler. There is no cross-drain
/// locking: overlapping drains may double-send, which is tolerated.
pub struct OutboxProcessor {
    store: Arc<dyn NotificationStore>,
    transport: Arc<dyn PushTransport>,
    max_attempts: i64,
}

impl OutboxProcessor {
    /// Creates a processor with the default attempt bound.
    pub fn new(store: Arc<dyn NotificationStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self::with_max_attempts(store, transport, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a processor with an explicit attempt bound.
    pub fn with_max_attempts(
        store: Arc<dyn NotificationStore>,
        transport: Arc<dyn PushTransport>,
        max_attempts: i64,
    ) -> Self {
        Self {
            store,
            transport,
            max_attempts,
        }
    }

    /// Drains one batch of up to `limit` unprocessed rows, oldest first.
    ///
    /// Rows are handled independently: a delivery or bookkeeping failure on
    /// one row never blocks the rest of the batch. The returned summary is
    /// informational; callers observe success through store state.
    pub async fn drain_batch(&self, limit: i64) -> DrainSummary {
        let mut summary = DrainSummary::default();

        let entries = match self.store.fetch_unprocessed(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "failed to fetch outbox batch");
                return summary;
            }
        };

        if entries.is_empty() {
            debug!("outbox empty, nothing to drain");
            return summary;
        }

        debug!(count = entries.len(), limit, "draining outbox batch");

        for entry in entries {
            if entry.attempts >= self.max_attempts {
                // Terminal give-up: processed without a successful delivery.
                // The notification is dropped, not errored.
                warn!(
                    outbox_id = entry.id,
                    notification_id = %entry.notification_id,
                    attempts = entry.attempts,
                    "delivery attempts exhausted, dropping notification"
                );
                if let Err(e) = self.store.mark_processed(entry.id).await {
                    error!(outbox_id = entry.id, error = %e, "failed to mark dropped row processed");
                }
                summary.dropped += 1;
                continue;
            }

            match self.deliver(&entry).await {
                Ok(()) => {
                    debug!(
                        outbox_id = entry.id,
                        notification_id = %entry.notification_id,
                        "push delivered"
                    );
                    if let Err(e) = self.store.mark_processed(entry.id).await {
                        error!(outbox_id = entry.id, error = %e, "failed to mark delivered row processed");
                    }
                    summary.delivered += 1;
                }
                Err(e) => {
                    // Transient and application failures alike: count the
                    // attempt and leave the row for the next drain.
                    warn!(
                        outbox_id = entry.id,
                        notification_id = %entry.notification_id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "push delivery failed, will retry on next drain"
                    );
                    if let Err(e) = self.store.bump_attempts(entry.id).await {
                        error!(outbox_id = entry.id, error = %e, "failed to increment attempts");
                    }
                    summary.retried += 1;
                }
            }
        }

        info!(
            delivered = summary.delivered,
            retried = summary.retried,
            dropped = summary.dropped,
            "outbox drain complete"
        );
        summary
    }

    /// Resolves the recipient's token and sends exactly one push.
    async fn deliver(&self, entry: &OutboxEntry) -> Result<(), ChimeError> {
        let payload = &entry.payload;
        let token = self
            .store
            .token_for_user(&payload.recipient)
            .await?
            .ok_or_else(|| ChimeError::Push {
                message: format!("no registered token for recipient {}", payload.recipient),
                source: None,
            })?;

        self.transport
            .send(&token, &payload.title, &payload.body, payload.data.as_ref())
            .await
    }
}
