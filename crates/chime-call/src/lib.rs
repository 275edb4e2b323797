// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incoming-call signal for the Chime notification service.
//!
//! [`CallSignal`] surfaces the single most recent unread call-kind
//! notification for one user as a live, reactive value. On start it hydrates
//! from the store, then follows the notification feed: a live insert of a
//! call rings the signal, a live read-update of the currently displayed
//! notification clears it (the call was resolved elsewhere).
//!
//! `accept()` and `decline()` clear the local state synchronously and patch
//! the backing record as a detached task; a patch failure is logged but the
//! local clear is never rolled back. The backing store stays the source of
//! truth, and reconciliation happens through feed updates.

use std::sync::Arc;

use chime_bus::{NotificationEvent, NotificationFeed};
use chime_core::types::{CallerProfile, IncomingCall, NotificationRecord};
use chime_core::NotificationStore;
use tokio::sync::broadcast;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Live handle to the incoming-call state of one user.
///
/// All feed events are consumed by a single background task, so no two
/// event handlers ever run concurrently for one signal. Dropping the handle
/// stops the task; in-flight patches and enrichment fetches are not
/// cancelled, their late results are discarded by identity checks.
pub struct CallSignal {
    shared: Arc<Shared>,
    rx: watch::Receiver<Option<IncomingCall>>,
    task: tokio::task::JoinHandle<()>,
}

struct Shared {
    store: Arc<dyn NotificationStore>,
    feed: NotificationFeed,
    user_id: String,
    tx: watch::Sender<Option<IncomingCall>>,
}

impl CallSignal {
    /// Starts the signal for `user_id`: subscribes to the feed, hydrates any
    /// pending call, and begins consuming live events.
    pub fn start(
        store: Arc<dyn NotificationStore>,
        feed: NotificationFeed,
        user_id: impl Into<String>,
    ) -> Self {
        let (tx, rx) = watch::channel(None);
        // Subscribe before hydration so no insert slips between the two.
        let events = feed.subscribe();
        let shared = Arc::new(Shared {
            store,
            feed,
            user_id: user_id.into(),
            tx,
        });
        let task = tokio::spawn(run(shared.clone(), events));
        Self { shared, rx, task }
    }

    /// The currently ringing call, if any.
    pub fn current(&self) -> Option<IncomingCall> {
        self.rx.borrow().clone()
    }

    /// A watch receiver observing every ring/clear transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<IncomingCall>> {
        self.rx.clone()
    }

    /// Accepts the ringing call, if any.
    ///
    /// Clears the local state synchronously and resolves the backing record
    /// as a detached task. Returns the call so the caller can proceed to the
    /// call screen without waiting for the backend.
    pub fn accept(&self) -> Option<IncomingCall> {
        resolve(&self.shared, "accept")
    }

    /// Declines the ringing call, if any. Same optimistic semantics as
    /// [`accept`], without returning the call.
    ///
    /// [`accept`]: CallSignal::accept
    pub fn decline(&self) {
        let _ = resolve(&self.shared, "decline");
    }

    /// Stops consuming feed events. Idempotent with drop.
    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for CallSignal {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Hydrates once, then consumes feed events serially until the feed closes.
async fn run(shared: Arc<Shared>, mut events: broadcast::Receiver<NotificationEvent>) {
    match shared.store.latest_unread_call(&shared.user_id).await {
        Ok(Some(record)) => ring(&shared, &record),
        Ok(None) => debug!(user_id = %shared.user_id, "no pending call on hydration"),
        // Fail open to Idle: a hydration error never crashes the signal.
        Err(e) => warn!(user_id = %shared.user_id, error = %e, "call hydration failed"),
    }

    loop {
        match events.recv().await {
            Ok(NotificationEvent::Inserted(record)) => on_insert(&shared, &record),
            Ok(NotificationEvent::Updated(record)) => on_update(&shared, &record),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(user_id = %shared.user_id, skipped, "notification feed lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(user_id = %shared.user_id, "notification feed closed");
                break;
            }
        }
    }
}

/// A live insert rings the signal when it is an unread call for this user.
/// The newest call always wins; an already ringing older call is replaced,
/// not queued.
fn on_insert(shared: &Arc<Shared>, record: &NotificationRecord) {
    if record.recipient != shared.user_id || !record.kind.is_call() || record.is_read {
        return;
    }
    ring(shared, record);
}

/// A live update clears the signal only when it marks the currently
/// displayed notification read; updates to other ids are ignored.
fn on_update(shared: &Shared, record: &NotificationRecord) {
    if !record.is_read {
        return;
    }
    let displayed = shared
        .tx
        .borrow()
        .as_ref()
        .is_some_and(|call| call.notification_id == record.id);
    if displayed {
        debug!(notification_id = %record.id, "call resolved elsewhere, clearing");
        shared.tx.send_replace(None);
    }
}

fn ring(shared: &Arc<Shared>, record: &NotificationRecord) {
    let Some(call) = IncomingCall::from_record(record) else {
        return;
    };
    debug!(
        notification_id = %call.notification_id,
        mode = %call.mode,
        caller_id = %call.caller_id,
        "incoming call ringing"
    );
    let notification_id = call.notification_id.clone();
    let caller_id = call.caller_id.clone();
    shared.tx.send_replace(Some(call));

    // Best-effort caller enrichment; a late result for a superseded call is
    // discarded by the identity check in apply_profile.
    let shared = shared.clone();
    tokio::spawn(async move {
        match shared.store.get_profile(&caller_id).await {
            Ok(Some(profile)) => {
                if !apply_profile(&shared.tx, &notification_id, &profile) {
                    debug!(notification_id = %notification_id, "stale enrichment discarded");
                }
            }
            Ok(None) => debug!(caller_id = %caller_id, "caller has no profile"),
            Err(e) => warn!(caller_id = %caller_id, error = %e, "caller profile fetch failed"),
        }
    });
}

/// Optimistic resolve shared by accept and decline: take the call out of
/// the local state, then patch the backend and publish the update as a
/// detached task.
fn resolve(shared: &Arc<Shared>, action: &'static str) -> Option<IncomingCall> {
    let call = shared.tx.send_replace(None)?;
    let notification_id = call.notification_id.clone();
    debug!(notification_id = %notification_id, action, "call resolved locally");

    let shared = shared.clone();
    tokio::spawn(async move {
        match shared.store.mark_resolved(&notification_id).await {
            Ok(Some(patched)) => {
                shared.feed.publish(NotificationEvent::Updated(patched));
            }
            Ok(None) => {
                warn!(notification_id = %notification_id, "resolved notification missing from store");
            }
            // No rollback: the banner is already dismissed, and the patch
            // is idempotent so a later retry path can repeat it.
            Err(e) => {
                warn!(notification_id = %notification_id, error = %e, "resolve patch failed");
            }
        }
    });

    Some(call)
}

/// Applies an enrichment result only if `notification_id` is still the
/// displayed call. Returns whether it was applied.
fn apply_profile(
    tx: &watch::Sender<Option<IncomingCall>>,
    notification_id: &str,
    profile: &CallerProfile,
) -> bool {
    tx.send_if_modified(|current| match current {
        Some(call) if call.notification_id == notification_id => {
            call.caller_name = profile.display_name.clone();
            call.caller_username = profile.username.clone();
            call.caller_avatar = profile.avatar_url.clone();
            true
        }
        _ => false,
    })
}
