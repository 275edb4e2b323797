// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification record operations.

use std::str::FromStr;

use chime_core::ChimeError;
use chime_core::types::{NotificationKind, NotificationRecord};
use rusqlite::params;

use crate::database::Database;

/// Insert a notification record.
pub async fn insert_notification(
    db: &Database,
    record: &NotificationRecord,
) -> Result<(), ChimeError> {
    let record = record.clone();
    let data_json = match &record.data {
        Some(data) => Some(serde_json::to_string(data).map_err(|e| ChimeError::Storage {
            source: Box::new(e),
        })?),
        None => None,
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notifications
                   (id, recipient, kind, actor, title, body, data, created_at,
                    is_read, read, processed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.recipient,
                    record.kind.to_string(),
                    record.actor,
                    record.title,
                    record.body,
                    data_json,
                    record.created_at,
                    record.is_read,
                    record.read,
                    record.processed,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return the single most recent unread call-kind notification for `recipient`.
///
/// Newest wins; older unread calls are implicitly superseded.
pub async fn latest_unread_call(
    db: &Database,
    recipient: &str,
) -> Result<Option<NotificationRecord>, ChimeError> {
    let recipient = recipient.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient, kind, actor, title, body, data, created_at,
                        is_read, read, processed
                 FROM notifications
                 WHERE recipient = ?1 AND is_read = 0
                   AND kind IN ('voice_call', 'video_call')
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
            )?;
            let mut rows = stmt.query_map(params![recipient], row_to_record)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `is_read`, `read`, and `processed` true on a notification.
///
/// Setting already-true flags true again is a no-op, which is what makes the
/// client's fire-and-forget resolve patch safe to repeat. Returns the patched
/// record, or `None` when the id does not exist.
pub async fn mark_resolved(
    db: &Database,
    id: &str,
) -> Result<Option<NotificationRecord>, ChimeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notifications SET is_read = 1, read = 1, processed = 1 WHERE id = ?1",
                params![id],
            )?;
            let mut stmt = conn.prepare(
                "SELECT id, recipient, kind, actor, title, body, data, created_at,
                        is_read, read, processed
                 FROM notifications WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id], row_to_record)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single notification by id.
pub async fn get_notification(
    db: &Database,
    id: &str,
) -> Result<Option<NotificationRecord>, ChimeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient, kind, actor, title, body, data, created_at,
                        is_read, read, processed
                 FROM notifications WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id], row_to_record)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRecord> {
    let kind_str: String = row.get(2)?;
    let kind = NotificationKind::from_str(&kind_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let data_json: Option<String> = row.get(6)?;
    let data = match data_json {
        Some(s) => Some(serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(NotificationRecord {
        id: row.get(0)?,
        recipient: row.get(1)?,
        kind,
        actor: row.get(3)?,
        title: row.get(4)?,
        body: row.get(5)?,
        data,
        created_at: row.get(7)?,
        is_read: row.get(8)?,
        read: row.get(9)?,
        processed: row.get(10)?,
    })
}
