// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile lookup for caller-identity enrichment.

use chime_core::ChimeError;
use chime_core::types::CallerProfile;
use rusqlite::params;

use crate::database::Database;

/// Insert or replace a user profile.
pub async fn upsert_profile(db: &Database, profile: &CallerProfile) -> Result<(), ChimeError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (id, display_name, username, avatar_url)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                   display_name = excluded.display_name,
                   username = excluded.username,
                   avatar_url = excluded.avatar_url",
                params![
                    profile.id,
                    profile.display_name,
                    profile.username,
                    profile.avatar_url,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a user profile by id.
pub async fn get_profile(
    db: &Database,
    user_id: &str,
) -> Result<Option<CallerProfile>, ChimeError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, username, avatar_url FROM profiles WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![user_id], |row| {
                Ok(CallerProfile {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    username: row.get(2)?,
                    avatar_url: row.get(3)?,
                })
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
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

    #[tokio::test]
    async fn upsert_and_get_profile() {
        let (db, _dir) = setup_db().await;

        let profile = CallerProfile {
            id: "u2".to_string(),
            display_name: Some("Ada".to_string()),
            username: Some("ada".to_string()),
            avatar_url: None,
        };
        upsert_profile(&db, &profile).await.unwrap();

        let fetched = get_profile(&db, "u2").await.unwrap().unwrap();
        assert_eq!(fetched, profile);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_profile_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_profile(&db, "ghost").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
