// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Chime workspace.
//!
//! Timestamps are stored as RFC 3339 strings in UTC with millisecond
//! precision, matching the TEXT columns in storage.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Returns the current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The kind of a notification record.
///
/// Only `VoiceCall` and `VideoCall` participate in the incoming-call signal;
/// the remaining kinds flow through the outbox like any other delivery.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    VoiceCall,
    VideoCall,
    Message,
    Follow,
    Comment,
    Like,
    Mention,
}

impl NotificationKind {
    /// True for the kinds that ring the incoming-call signal.
    pub fn is_call(&self) -> bool {
        matches!(self, NotificationKind::VoiceCall | NotificationKind::VideoCall)
    }
}

/// The media mode of an incoming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallMode {
    Voice,
    Video,
}

impl CallMode {
    /// Maps a call-kind notification to its media mode. Non-call kinds return `None`.
    pub fn from_kind(kind: NotificationKind) -> Option<Self> {
        match kind {
            NotificationKind::VoiceCall => Some(CallMode::Voice),
            NotificationKind::VideoCall => Some(CallMode::Video),
            _ => None,
        }
    }
}

/// The delivery payload stored in an outbox row.
///
/// `recipient` is a user id; token resolution happens at drain time so a
/// token registered after enqueue is still picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub recipient: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A row in the notification outbox.
///
/// `processed = true` means the row is terminal: either the delivery
/// succeeded, or `attempts` reached the configured maximum and the row was
/// dropped. Processed rows are never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub id: i64,
    pub notification_id: String,
    pub payload: DeliveryPayload,
    pub attempts: i64,
    pub processed: bool,
    pub processed_at: Option<String>,
    pub created_at: String,
}

/// A notification record as persisted in the notifications table.
///
/// The three read flags (`is_read`, `read`, `processed`) transition
/// false -> true exactly once when the notification is resolved; the client
/// never resets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient: String,
    pub kind: NotificationKind,
    pub actor: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub created_at: String,
    pub is_read: bool,
    pub read: bool,
    pub processed: bool,
}

/// A user profile subset used to enrich the caller identity on an incoming call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// An ephemeral, client-local projection of a call-kind notification.
///
/// Exists only in memory while the call is ringing; the backing
/// [`NotificationRecord`] remains the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingCall {
    pub notification_id: String,
    pub conversation_id: Option<String>,
    pub mode: CallMode,
    pub caller_id: String,
    pub caller_name: Option<String>,
    pub caller_username: Option<String>,
    pub caller_avatar: Option<String>,
    pub message: String,
    pub created_at: String,
}

impl IncomingCall {
    /// Projects a call-kind notification into an incoming call.
    ///
    /// Returns `None` for non-call kinds. The conversation id is read from
    /// the record's `data.conversation_id` when present. Caller identity
    /// fields start empty and are enriched asynchronously.
    pub fn from_record(record: &NotificationRecord) -> Option<Self> {
        let mode = CallMode::from_kind(record.kind)?;
        let conversation_id = record
            .data
            .as_ref()
            .and_then(|d| d.get("conversation_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Some(Self {
            notification_id: record.id.clone(),
            conversation_id,
            mode,
            caller_id: record.actor.clone(),
            caller_name: None,
            caller_username: None,
            caller_avatar: None,
            message: record.body.clone(),
            created_at: record.created_at.clone(),
        })
    }
}

/// Outbox depth broken down by outcome, for status reporting.
///
/// A processed row with `attempts >= max_attempts` can only have got there
/// by exhausting retries, so the split needs no extra column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutboxCounts {
    pub pending: i64,
    pub delivered: i64,
    pub dropped: i64,
}

/// Per-drain outcome counts reported by the outbox processor.
///
/// Purely informational; callers may ignore it. Success is observed through
/// store state, not through this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Rows whose push was accepted by the gateway.
    pub delivered: usize,
    /// Rows left pending with an incremented attempt count.
    pub retried: usize,
    /// Rows forced terminal after exhausting attempts.
    pub dropped: usize,
}
