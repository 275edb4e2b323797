// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device token registry operations.
//!
//! One token per user; a re-registration replaces the previous token.

use chime_core::ChimeError;
use rusqlite::params;

use crate::database::Database;

/// Register or replace the push token for a user.
pub async fn upsert_token(db: &Database, user_id: &str, token: &str) -> Result<(), ChimeError> {
    let user_id = user_id.to_string();
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO device_tokens (user_id, token) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                   token = excluded.token,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user_id, token],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up the registered push token for a user.
pub async fn token_for_user(db: &Database, user_id: &str) -> Result<Option<String>, ChimeError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT token FROM device_tokens WHERE user_id = ?1")?;
            let mut rows = stmt.query_map(params![user_id], |row| row.get(0))?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
