// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use chime_core::ChimeError;
use tracing::debug;

/// Handle to the single SQLite connection.
///
/// Opening runs PRAGMA setup and all pending migrations. Query modules
/// accept `&Database` and go through [`Database::connection`].
#[derive(Debug)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path` with WAL mode.
    pub async fn open(path: &str) -> Result<Self, ChimeError> {
        Self::open_with_options(path, true).await
    }

    /// Opens the database at `path`, optionally enabling WAL mode.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, ChimeError> {
        // Connection::open surfaces the underlying rusqlite error directly.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ChimeError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        // Migrations run on the connection's background thread; the inner
        // result carries migration failures out of the closure.
        conn.call(|conn| Ok(crate::migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)??;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(&self) -> Result<(), ChimeError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Maps a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ChimeError {
    ChimeError::Storage {
        source: Box::new(e),
    }
}
