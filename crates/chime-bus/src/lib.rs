// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed notification feed for the Chime service.
//!
//! An in-process change feed over `tokio::sync::broadcast`: writers publish
//! row-level insert/update events and any number of subscribers consume them
//! live. Events carry the full post-change record, so consumers never need a
//! read-back. Filtering by recipient is the consumer's job.

use chime_core::types::NotificationRecord;
use chime_core::{ChimeError, NotificationStore};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default buffered capacity per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// A row-level change event on the notifications table.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A new notification row was inserted.
    Inserted(NotificationRecord),
    /// An existing notification row was updated; carries the new row state.
    Updated(NotificationRecord),
}

impl NotificationEvent {
    /// The post-change record carried by this event.
    pub fn record(&self) -> &NotificationRecord {
        match self {
            NotificationEvent::Inserted(record) => record,
            NotificationEvent::Updated(record) => record,
        }
    }
}

/// Handle to the notification feed. Cheap to clone; all clones share the
/// same channel.
#[derive(Clone)]
pub struct NotificationFeed {
    tx: broadcast::Sender<NotificationEvent>,
}

impl NotificationFeed {
    /// Creates a feed with the default per-subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a feed with an explicit per-subscriber capacity.
    ///
    /// A subscriber that falls more than `capacity` events behind loses the
    /// oldest events and observes a `Lagged` error on its receiver.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Publishing with no subscribers is not an error; the event is simply
    /// dropped, like a realtime feed with no open connections.
    pub fn publish(&self, event: NotificationEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(receivers, "notification event published"),
            Err(_) => debug!("notification event dropped: no subscribers"),
        }
    }

    /// Opens a new subscription receiving all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    /// Number of currently open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts a notification through the store and publishes the insert event.
///
/// The store write happens first; a publish only ever announces a row that
/// exists. A failed write publishes nothing.
pub async fn insert_and_publish(
    store: &dyn NotificationStore,
    feed: &NotificationFeed,
    record: &NotificationRecord,
) -> Result<(), ChimeError> {
    store.insert_notification(record).await?;
    feed.publish(NotificationEvent::Inserted(record.clone()));
    Ok(())
}
