// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox row operations backing the delivery retry engine.
//!
//! Rows move one way: unprocessed -> processed. A processed row is terminal,
//! whether the delivery succeeded or attempts ran out; it is never selected
//! again. There is no claiming step, so overlapping drains may pick up the
//! same row. Duplicate pushes are tolerated.

use chime_core::ChimeError;
use chime_core::types::{DeliveryPayload, OutboxCounts, OutboxEntry};
use rusqlite::params;

use crate::database::Database;

/// Append a delivery to the outbox. Returns the auto-generated row id.
pub async fn enqueue(
    db: &Database,
    notification_id: &str,
    payload: &DeliveryPayload,
) -> Result<i64, ChimeError> {
    let notification_id = notification_id.to_string();
    let payload_json = serde_json::to_string(payload).map_err(|e| ChimeError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notification_outbox (notification_id, payload) VALUES (?1, ?2)",
                params![notification_id, payload_json],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch up to `limit` unprocessed rows, oldest first.
///
/// FIFO ordering keeps early failures from being starved by newer rows.
pub async fn fetch_unprocessed(
    db: &Database,
    limit: i64,
) -> Result<Vec<OutboxEntry>, ChimeError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, notification_id, payload, attempts, processed, processed_at, created_at
                 FROM notification_outbox
                 WHERE processed = 0
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a row terminal: `processed = true`, `processed_at = now`.
///
/// Called both after a successful delivery and when attempts are exhausted.
pub async fn mark_processed(db: &Database, id: i64) -> Result<(), ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notification_outbox SET processed = 1,
                 processed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Increment a row's attempt counter, leaving `processed = false`.
///
/// The row stays eligible for the next drain cycle.
pub async fn bump_attempts(db: &Database, id: i64) -> Result<(), ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notification_outbox SET attempts = attempts + 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count outbox rows by outcome.
///
/// A processed row with `attempts >= max_attempts` was dropped; any other
/// processed row was delivered.
pub async fn counts(db: &Database, max_attempts: i64) -> Result<OutboxCounts, ChimeError> {
    db.connection()
        .call(move |conn| {
            let counts = conn.query_row(
                "SELECT
                   COUNT(*) FILTER (WHERE processed = 0),
                   COUNT(*) FILTER (WHERE processed = 1 AND attempts < ?1),
                   COUNT(*) FILTER (WHERE processed = 1 AND attempts >= ?1)
                 FROM notification_outbox",
                params![max_attempts],
                |row| {
                    Ok(OutboxCounts {
                        pending: row.get(0)?,
                        delivered: row.get(1)?,
                        dropped: row.get(2)?,
                    })
                },
            )?;
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single row by id (test and status helper).
pub async fn get_entry(db: &Database, id: i64) -> Result<Option<OutboxEntry>, ChimeError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, notification_id, payload, attempts, processed, processed_at, created_at
                 FROM notification_outbox WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id], row_to_entry)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxEntry> {
    let payload_json: String = row.get(2)?;
    let payload: DeliveryPayload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(OutboxEntry {
        id: row.get(0)?,
        notification_id: row.get(1)?,
        payload,
        attempts: row.get(3)?,
        processed: row.get(4)?,
        processed_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn payload(recipient: &str) -> DeliveryPayload {
        DeliveryPayload {
            recipient: recipient.to_string(),
            title: "Incoming call".to_string(),
            body: "someone is calling".to_string(),
            data: Some(serde_json::json!({"conversation_id": "c1"})),
        }
    }

    #[tokio::test]
    async fn enqueue_and_fetch_round_trip() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "n1", &payload("u1")).await.unwrap();
        assert!(id > 0);

        let entries = fetch_unprocessed(&db, 50).await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.id, id);
        assert_eq!(entry.notification_id, "n1");
        assert_eq!(entry.payload, payload("u1"));
        assert_eq!(entry.attempts, 0);
        assert!(!entry.processed);
        assert!(entry.processed_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fetch_is_fifo_and_respects_limit() {
        let (db, _dir) = setup_db().await;

        // created_at has millisecond precision; insertion order breaks ties
        // via the id tiebreak.
        let first = enqueue(&db, "n1", &payload("u1")).await.unwrap();
        let _second = enqueue(&db, "n2", &payload("u2")).await.unwrap();

        let entries = fetch_unprocessed(&db, 1).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, first, "oldest row must come first");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_processed_removes_row_from_fetch() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "n1", &payload("u1")).await.unwrap();
        mark_processed(&db, id).await.unwrap();

        let entries = fetch_unprocessed(&db, 50).await.unwrap();
        assert!(entries.is_empty());

        let entry = get_entry(&db, id).await.unwrap().unwrap();
        assert!(entry.processed);
        assert!(entry.processed_at.is_some());
        assert_eq!(entry.attempts, 0, "success must not touch attempts");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn bump_attempts_keeps_row_pending() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "n1", &payload("u1")).await.unwrap();
        bump_attempts(&db, id).await.unwrap();
        bump_attempts(&db, id).await.unwrap();

        let entries = fetch_unprocessed(&db, 50).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attempts, 2);
        assert!(!entries[0].processed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counts_split_by_outcome() {
        let (db, _dir) = setup_db().await;

        // One pending, one delivered, one dropped at max attempts.
        let _pending = enqueue(&db, "n1", &payload("u1")).await.unwrap();

        let delivered = enqueue(&db, "n2", &payload("u2")).await.unwrap();
        mark_processed(&db, delivered).await.unwrap();

        let dropped = enqueue(&db, "n3", &payload("u3")).await.unwrap();
        for _ in 0..5 {
            bump_attempts(&db, dropped).await.unwrap();
        }
        mark_processed(&db, dropped).await.unwrap();

        let counts = counts(&db, 5).await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.delivered, 1);
        assert_eq!(counts.dropped, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fetch_empty_outbox_returns_nothing() {
        let (db, _dir) = setup_db().await;
        let entries = fetch_unprocessed(&db, 50).await.unwrap();
        assert!(entries.is_empty());
        db.close().await.unwrap();
    }
}
