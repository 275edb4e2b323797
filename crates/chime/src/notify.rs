// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chime notify` and `chime register-token` command implementations.
//!
//! Notify writes the notification record and its outbox row in one go, the
//! same path a backend trigger would take. Delivery happens on the next
//! drain, not here.

use std::str::FromStr;

use chime_bus::NotificationFeed;
use chime_config::model::ChimeConfig;
use chime_core::types::{DeliveryPayload, NotificationKind, NotificationRecord};
use chime_core::{ChimeError, NotificationStore, now_rfc3339};
use chime_storage::SqliteStorage;
use uuid::Uuid;

pub struct NotifyArgs {
    pub recipient: String,
    pub kind: String,
    pub actor: String,
    pub title: String,
    pub body: String,
    pub data: Option<String>,
}

/// Runs the `chime notify` command.
pub async fn run_notify(config: &ChimeConfig, args: NotifyArgs) -> Result<(), ChimeError> {
    let kind = NotificationKind::from_str(&args.kind)
        .map_err(|_| ChimeError::Internal(format!("unknown notification kind: {}", args.kind)))?;
    let data = args
        .data
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| ChimeError::Internal(format!("invalid --data JSON: {e}")))?;

    let record = NotificationRecord {
        id: Uuid::new_v4().to_string(),
        recipient: args.recipient,
        kind,
        actor: args.actor,
        title: args.title,
        body: args.body,
        data,
        created_at: now_rfc3339(),
        is_read: false,
        read: false,
        processed: false,
    };
    let payload = DeliveryPayload {
        recipient: record.recipient.clone(),
        title: record.title.clone(),
        body: record.body.clone(),
        data: record.data.clone(),
    };

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    // One-shot process: the insert event has no subscribers here and drops.
    chime_bus::insert_and_publish(&storage, &NotificationFeed::new(), &record).await?;
    let outbox_id = storage.enqueue(&record.id, &payload).await?;
    storage.close().await?;

    println!("notification {} queued (outbox row {outbox_id})", record.id);
    Ok(())
}

/// Runs the `chime register-token` command.
pub async fn run_register_token(
    config: &ChimeConfig,
    user_id: &str,
    token: &str,
) -> Result<(), ChimeError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    storage.upsert_token(user_id, token).await?;
    storage.close().await?;

    println!("token registered for {user_id}");
    Ok(())
}
