// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the NotificationStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use chime_config::model::StorageConfig;
use chime_core::types::{
    CallerProfile, DeliveryPayload, NotificationRecord, OutboxCounts, OutboxEntry,
};
use chime_core::{ChimeError, NotificationStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed notification store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: SqliteStorage::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database at the configured path and runs migrations.
    pub async fn initialize(&self) -> Result<(), ChimeError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ChimeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL and flushes pending writes.
    pub async fn close(&self) -> Result<(), ChimeError> {
        self.db()?.close().await
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ChimeError> {
        self.db.get().ok_or_else(|| ChimeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl NotificationStore for SqliteStorage {
    // --- Outbox operations ---

    async fn enqueue(
        &self,
        notification_id: &str,
        payload: &DeliveryPayload,
    ) -> Result<i64, ChimeError> {
        queries::outbox::enqueue(self.db()?, notification_id, payload).await
    }

    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<OutboxEntry>, ChimeError> {
        queries::outbox::fetch_unprocessed(self.db()?, limit).await
    }

    async fn mark_processed(&self, id: i64) -> Result<(), ChimeError> {
        queries::outbox::mark_processed(self.db()?, id).await
    }

    async fn bump_attempts(&self, id: i64) -> Result<(), ChimeError> {
        queries::outbox::bump_attempts(self.db()?, id).await
    }

    async fn outbox_counts(&self, max_attempts: i64) -> Result<OutboxCounts, ChimeError> {
        queries::outbox::counts(self.db()?, max_attempts).await
    }

    // --- Notification operations ---

    async fn insert_notification(&self, record: &NotificationRecord) -> Result<(), ChimeError> {
        queries::notifications::insert_notification(self.db()?, record).await
    }

    async fn latest_unread_call(
        &self,
        recipient: &str,
    ) -> Result<Option<NotificationRecord>, ChimeError> {
        queries::notifications::latest_unread_call(self.db()?, recipient).await
    }

    async fn mark_resolved(&self, id: &str) -> Result<Option<NotificationRecord>, ChimeError> {
        queries::notifications::mark_resolved(self.db()?, id).await
    }

    // --- Device token operations ---

    async fn upsert_token(&self, user_id: &str, token: &str) -> Result<(), ChimeError> {
        queries::tokens::upsert_token(self.db()?, user_id, token).await
    }

    async fn token_for_user(&self, user_id: &str) -> Result<Option<String>, ChimeError> {
        queries::tokens::token_for_user(self.db()?, user_id).await
    }

    // --- Profile operations ---

    async fn upsert_profile(&self, profile: &CallerProfile) -> Result<(), ChimeError> {
        queries::profiles::upsert_profile(self.db()?, profile).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<CallerProfile>, ChimeError> {
        queries::profiles::get_profile(self.db()?, user_id).await
    }
}
