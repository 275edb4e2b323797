// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Chime pipeline.
//!
//! Each test builds an isolated harness with a temp SQLite database and a
//! wiremock push gateway, then exercises the same paths the binary wires
//! together. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chime_bus::NotificationFeed;
use chime_call::CallSignal;
use chime_config::model::ChimeConfig;
use chime_core::types::{DeliveryPayload, NotificationKind, NotificationRecord};
use chime_core::{NotificationStore, now_rfc3339};
use chime_outbox::OutboxProcessor;
use chime_push::ExpoPush;
use chime_storage::SqliteStorage;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    config: ChimeConfig,
    storage: Arc<SqliteStorage>,
    gateway: MockServer,
    _dir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("e2e.db");
        let gateway = MockServer::start().await;

        let toml = format!(
            r#"
            [storage]
            database_path = "{}"

            [push]
            gateway_url = "{}/push/send"
            timeout_secs = 5

            [outbox]
            batch_limit = 50
            max_attempts = 3
            "#,
            db_path.display(),
            gateway.uri()
        );
        let config = chime_config::load_and_validate_str(&toml).unwrap();

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await.unwrap();

        Self {
            config,
            storage,
            gateway,
            _dir: dir,
        }
    }

    fn processor(&self) -> OutboxProcessor {
        let transport = Arc::new(ExpoPush::new(&self.config.push).unwrap());
        OutboxProcessor::with_max_attempts(
            self.storage.clone(),
            transport,
            self.config.outbox.max_attempts,
        )
    }

    /// Records a notification and queues its delivery, like `chime notify`.
    async fn notify(&self, id: &str, recipient: &str, kind: NotificationKind) -> i64 {
        let record = NotificationRecord {
            id: id.to_string(),
            recipient: recipient.to_string(),
            kind,
            actor: "u2".to_string(),
            title: "Incoming call".to_string(),
            body: "u2 is calling you".to_string(),
            data: Some(serde_json::json!({"conversation_id": "c1"})),
            created_at: now_rfc3339(),
            is_read: false,
            read: false,
            processed: false,
        };
        self.storage.insert_notification(&record).await.unwrap();
        let payload = DeliveryPayload {
            recipient: record.recipient.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            data: record.data.clone(),
        };
        self.storage.enqueue(id, &payload).await.unwrap()
    }
}

fn ok_ticket() -> serde_json::Value {
    serde_json::json!({"data": {"status": "ok", "id": "ticket-1"}})
}

// ---- Notify-to-delivery pipeline ----

#[tokio::test]
async fn notification_flows_from_enqueue_to_gateway() {
    let harness = Harness::new().await;
    harness
        .storage
        .upsert_token("u1", "ExponentPushToken[abc]")
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/push/send"))
        .and(body_partial_json(serde_json::json!({
            "to": "ExponentPushToken[abc]",
            "title": "Incoming call",
            "body": "u2 is calling you",
            "data": {"conversation_id": "c1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ticket()))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    harness.notify("n1", "u1", NotificationKind::VoiceCall).await;
    let summary = harness.processor().drain_batch(50).await;

    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.retried, 0);
    assert_eq!(summary.dropped, 0);

    let counts = harness
        .storage
        .outbox_counts(harness.config.outbox.max_attempts)
        .await
        .unwrap();
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.delivered, 1);
}

#[tokio::test]
async fn failed_delivery_is_retried_on_the_next_drain() {
    let harness = Harness::new().await;
    harness
        .storage
        .upsert_token("u1", "ExponentPushToken[abc]")
        .await
        .unwrap();

    // Gateway fails once, then recovers.
    Mock::given(method("POST"))
        .and(path("/push/send"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&harness.gateway)
        .await;
    Mock::given(method("POST"))
        .and(path("/push/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ticket()))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    harness.notify("n1", "u1", NotificationKind::Message).await;
    let processor = harness.processor();

    let first = processor.drain_batch(50).await;
    assert_eq!(first.retried, 1);
    assert_eq!(first.delivered, 0);

    let second = processor.drain_batch(50).await;
    assert_eq!(second.delivered, 1);
}

#[tokio::test]
async fn exhausted_row_is_dropped_without_contacting_the_gateway() {
    let harness = Harness::new().await;
    harness
        .storage
        .upsert_token("u1", "ExponentPushToken[abc]")
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/push/send"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&harness.gateway)
        .await;

    harness.notify("n1", "u1", NotificationKind::Message).await;
    let processor = harness.processor();

    // max_attempts is 3: three failing drains, then a terminal drop on the
    // fourth with no further gateway traffic.
    for _ in 0..3 {
        let summary = processor.drain_batch(50).await;
        assert_eq!(summary.retried, 1);
    }
    let last = processor.drain_batch(50).await;
    assert_eq!(last.dropped, 1);

    let counts = harness
        .storage
        .outbox_counts(harness.config.outbox.max_attempts)
        .await
        .unwrap();
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.dropped, 1);
}

// ---- Incoming-call signal over the same store ----

#[tokio::test]
async fn call_notification_rings_and_accept_resolves_the_record() {
    let harness = Harness::new().await;
    harness.notify("n1", "u1", NotificationKind::VideoCall).await;

    let feed = NotificationFeed::new();
    let mut updates = feed.subscribe();
    let signal = CallSignal::start(harness.storage.clone(), feed.clone(), "u1");

    let mut rx = signal.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|call| call.is_some()))
        .await
        .expect("call should ring after hydration")
        .unwrap();

    let call = signal.accept().unwrap();
    assert_eq!(call.notification_id, "n1");
    assert_eq!(call.conversation_id.as_deref(), Some("c1"));

    // The detached resolve publishes the patched record.
    let event = tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("resolve should publish an update")
        .unwrap();
    let patched = event.record();
    assert_eq!(patched.id, "n1");
    assert!(patched.is_read && patched.read && patched.processed);

    // The notification no longer rings, but its push delivery is untouched.
    assert!(harness.storage.latest_unread_call("u1").await.unwrap().is_none());
    let counts = harness
        .storage
        .outbox_counts(harness.config.outbox.max_attempts)
        .await
        .unwrap();
    assert_eq!(counts.pending, 1);
}

#[tokio::test]
async fn live_insert_reaches_a_running_signal() {
    let harness = Harness::new().await;

    let feed = NotificationFeed::new();
    let signal = CallSignal::start(harness.storage.clone(), feed.clone(), "u1");
    let mut rx = signal.subscribe();

    let record = NotificationRecord {
        id: "n9".to_string(),
        recipient: "u1".to_string(),
        kind: NotificationKind::VoiceCall,
        actor: "u2".to_string(),
        title: "Incoming call".to_string(),
        body: "u2 is calling you".to_string(),
        data: Some(serde_json::json!({"conversation_id": "c7"})),
        created_at: now_rfc3339(),
        is_read: false,
        read: false,
        processed: false,
    };
    chime_bus::insert_and_publish(harness.storage.as_ref(), &feed, &record)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|call| call.is_some()))
        .await
        .expect("published insert should ring")
        .unwrap();
    assert_eq!(signal.current().unwrap().conversation_id.as_deref(), Some("c7"));
}
