// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for the outbox, notifications, device tokens, and profiles.

use async_trait::async_trait;

use crate::error::ChimeError;
use crate::types::{
    CallerProfile, DeliveryPayload, NotificationRecord, OutboxEntry, OutboxCounts,
};

/// Persistence operations backing the outbox processor and the call signal.
///
/// All mutations are single-row patches; there are no multi-row transactions
/// across these calls. Implemented by `SqliteStorage` in `chime-storage`.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    // --- Outbox operations ---

    /// Appends a delivery to the outbox. Returns the generated row id.
    async fn enqueue(
        &self,
        notification_id: &str,
        payload: &DeliveryPayload,
    ) -> Result<i64, ChimeError>;

    /// Fetches up to `limit` unprocessed rows, oldest first.
    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<OutboxEntry>, ChimeError>;

    /// Marks a row terminal: `processed = true`, `processed_at = now`.
    async fn mark_processed(&self, id: i64) -> Result<(), ChimeError>;

    /// Increments a row's attempt counter, leaving it eligible for retry.
    async fn bump_attempts(&self, id: i64) -> Result<(), ChimeError>;

    /// Counts outbox rows by outcome for status reporting.
    async fn outbox_counts(&self, max_attempts: i64) -> Result<OutboxCounts, ChimeError>;

    // --- Notification operations ---

    /// Inserts a notification record.
    async fn insert_notification(&self, record: &NotificationRecord) -> Result<(), ChimeError>;

    /// Returns the single most recent unread call-kind notification for
    /// `recipient`, if any.
    async fn latest_unread_call(
        &self,
        recipient: &str,
    ) -> Result<Option<NotificationRecord>, ChimeError>;

    /// Sets `is_read`, `read`, and `processed` true on a notification.
    ///
    /// Idempotent: re-resolving an already resolved notification is a no-op.
    /// Returns the patched record when the id exists.
    async fn mark_resolved(&self, id: &str) -> Result<Option<NotificationRecord>, ChimeError>;

    // --- Device token operations ---

    /// Registers or replaces the push token for a user.
    async fn upsert_token(&self, user_id: &str, token: &str) -> Result<(), ChimeError>;

    /// Looks up the registered push token for a user.
    async fn token_for_user(&self, user_id: &str) -> Result<Option<String>, ChimeError>;

    // --- Profile operations ---

    /// Registers or replaces a user profile.
    async fn upsert_profile(&self, profile: &CallerProfile) -> Result<(), ChimeError>;

    /// Looks up a user profile for caller-identity enrichment.
    async fn get_profile(&self, user_id: &str) -> Result<Option<CallerProfile>, ChimeError>;
}
