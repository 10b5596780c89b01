// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch loop behaviour against the in-memory store and mock sender.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use courier_core::{Message, MessageId, SendOutcome, SendStatus};
use courier_dispatch::{DispatchLoop, DispatchSettings};
use courier_test_utils::{MemoryStore, MockSender};
use tokio_util::sync::CancellationToken;

fn settings() -> DispatchSettings {
    DispatchSettings {
        interval: Duration::from_secs(30),
        max_concurrent_sends: 4,
        respect_start_date: false,
        store_timeout: Duration::from_secs(5),
        send_timeout: Duration::from_secs(3),
    }
}

fn dispatch(store: &Arc<MemoryStore>, sender: &Arc<MockSender>, settings: DispatchSettings) -> DispatchLoop {
    DispatchLoop::new(store.clone(), sender.clone(), settings)
}

#[tokio::test(start_paused = true)]
async fn success_then_timeout_then_retry() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now, now + ChronoDuration::hours(1), "vip sale", "vip");
    let c1 = store.add_client("79000000001", "vip");
    let c2 = store.add_client("79000000002", "vip");
    sender.stall_next(c2.id, Duration::from_secs(60));

    let looper = dispatch(&store, &sender, settings());
    let first = looper.run_cycle(now).await;
    assert_eq!(first.messages_ensured, 2);
    assert_eq!((first.sent, first.failed), (1, 1));

    let m1 = store.message_for(d.id, c1.id).unwrap();
    let m2 = store.message_for(d.id, c2.id).unwrap();
    assert_eq!(m1.send_status, SendStatus::Sent);
    assert!(m1.send_date.is_some());
    assert_eq!(m2.send_status, SendStatus::Fail);
    assert!(m2.send_date.is_none());

    let second = looper.run_cycle(now + ChronoDuration::seconds(30)).await;
    assert_eq!(second.already_sent, 1);
    assert_eq!(second.sent, 1);
    assert_eq!(sender.calls_for(c1.id), 1);
    assert_eq!(sender.calls_for(c2.id), 2);

    let m2 = store.message_for(d.id, c2.id).unwrap();
    assert_eq!(m2.send_status, SendStatus::Sent);
    assert!(m2.send_date.is_some());
    assert_eq!(store.messages().len(), 2);
}

#[tokio::test]
async fn repeated_cycles_create_no_new_rows() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    let c = store.add_client("79000000001", "vip");
    sender.script_outcomes(c.id, [SendOutcome::failed("busy"), SendOutcome::failed("busy")]);

    let looper = dispatch(&store, &sender, settings());
    for _ in 0..3 {
        looper.run_cycle(now).await;
    }
    assert_eq!(store.messages().len(), 1);
    assert_eq!(sender.calls_for(c.id), 3);
    assert_eq!(store.message_for(d.id, c.id).unwrap().send_status, SendStatus::Sent);
}

#[tokio::test]
async fn sent_messages_are_never_resent() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    let c = store.add_client("79000000001", "vip");

    let looper = dispatch(&store, &sender, settings());
    looper.run_cycle(now).await;
    let report = looper.run_cycle(now).await;
    assert_eq!(report.already_sent, 1);
    assert_eq!(report.sent + report.failed, 0);
    assert_eq!(sender.calls_for(c.id), 1);
}

#[tokio::test]
async fn end_date_boundary_and_expired_messages_untouched() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now - ChronoDuration::hours(1), now, "edge", "vip");
    let c = store.add_client("79000000001", "vip");
    sender.script_outcomes(c.id, [SendOutcome::failed("down")]);

    let looper = dispatch(&store, &sender, settings());
    let at_end = looper.run_cycle(now).await;
    assert_eq!(at_end.distributions, 1);
    assert_eq!(store.message_for(d.id, c.id).unwrap().send_status, SendStatus::Fail);

    let after = looper.run_cycle(now + ChronoDuration::seconds(1)).await;
    assert_eq!(after.distributions, 0);
    assert_eq!(sender.calls_for(c.id), 1);
    let untouched = store.message_for(d.id, c.id).unwrap();
    assert_eq!(untouched.send_status, SendStatus::Fail);
}

#[tokio::test]
async fn deleted_distributions_and_clients_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let gone = store.add_distribution(now, now + ChronoDuration::hours(1), "gone", "vip");
    store.delete_distribution(gone.id);
    store.add_distribution(now, now + ChronoDuration::hours(1), "live", "vip");
    let kept = store.add_client("79000000001", "vip");
    let removed = store.add_client("79000000002", "vip");
    store.delete_client(removed.id);

    let report = dispatch(&store, &sender, settings()).run_cycle(now).await;
    assert_eq!(report.distributions, 1);
    let calls = sender.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].client_id, kept.id);
    assert_eq!(calls[0].text, "live");
}

#[tokio::test]
async fn store_error_aborts_only_that_distribution() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let first = store.add_distribution(now, now + ChronoDuration::hours(1), "first", "vip");
    let second = store.add_distribution(now, now + ChronoDuration::hours(1), "second", "vip");
    let c = store.add_client("79000000001", "vip");
    store.fail_next_client_queries(1);

    let looper = dispatch(&store, &sender, settings());
    let report = looper.run_cycle(now).await;
    assert_eq!(report.distributions_failed, 1);
    assert_eq!(report.sent, 1);
    assert!(store.message_for(first.id, c.id).is_none());
    assert!(store.message_for(second.id, c.id).is_some());

    let retry = looper.run_cycle(now).await;
    assert_eq!(retry.distributions_failed, 0);
    assert_eq!(
        store.message_for(first.id, c.id).unwrap().send_status,
        SendStatus::Sent
    );
}

#[tokio::test]
async fn listing_failure_yields_empty_report() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    store.add_client("79000000001", "vip");
    store.fail_next_distribution_queries(1);

    let report = dispatch(&store, &sender, settings()).run_cycle(now).await;
    assert_eq!(report.distributions, 0);
    assert!(sender.calls().is_empty());
}

#[tokio::test]
async fn failed_status_write_leaves_message_for_next_cycle() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    let c = store.add_client("79000000001", "vip");
    store.fail_next_updates(1);

    let looper = dispatch(&store, &sender, settings());
    let report = looper.run_cycle(now).await;
    assert_eq!(report.record_errors, 1);
    assert_eq!(store.message_for(d.id, c.id).unwrap().send_status, SendStatus::NotSent);

    looper.run_cycle(now).await;
    assert_eq!(store.message_for(d.id, c.id).unwrap().send_status, SendStatus::Sent);
}

#[tokio::test]
async fn ensure_failure_skips_only_that_pair() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    let skipped = store.add_client("79000000001", "vip");
    for i in 2..5 {
        store.add_client(&format!("7900000000{i}"), "vip");
    }
    store.fail_next_finds(1);

    let report = dispatch(&store, &sender, settings()).run_cycle(now).await;
    assert_eq!(report.messages_ensured, 3);
    assert_eq!(report.record_errors, 1);
    assert_eq!(report.sent, 3);
    assert!(store.message_for(d.id, skipped.id).is_none());
    assert_eq!(sender.calls_for(skipped.id), 0);
}

#[tokio::test]
async fn stored_fail_is_retried_and_existing_rows_reused() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    let d = store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    let c = store.add_client("79000000001", "vip");
    let existing = Message {
        id: MessageId(100),
        distribution_id: d.id,
        client_id: c.id,
        send_date: None,
        send_status: SendStatus::Fail,
    };
    store.put_message(existing);

    let report = dispatch(&store, &sender, settings()).run_cycle(now).await;
    assert_eq!(report.sent, 1);
    let rows = store.messages();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, MessageId(100));
    assert_eq!(rows[0].send_status, SendStatus::Sent);
    assert_eq!(sender.calls()[0].message_id, MessageId(100));
}

#[tokio::test(start_paused = true)]
async fn sends_are_bounded_by_max_concurrency() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    sender.set_delay(Duration::from_millis(100));
    let now = Utc::now();
    store.add_distribution(now, now + ChronoDuration::hours(1), "t", "vip");
    for i in 0..10 {
        store.add_client(&format!("790000000{i:02}"), "vip");
    }

    let report = dispatch(&store, &sender, DispatchSettings { max_concurrent_sends: 3, ..settings() })
        .run_cycle(now)
        .await;
    assert_eq!(report.sent, 10);
    assert_eq!(sender.peak_in_flight(), 3);
}

#[tokio::test]
async fn future_start_date_respected_only_when_configured() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    store.add_distribution(now + ChronoDuration::hours(1), now + ChronoDuration::hours(2), "later", "vip");
    store.add_client("79000000001", "vip");

    let gated = dispatch(&store, &sender, DispatchSettings { respect_start_date: true, ..settings() })
        .run_cycle(now)
        .await;
    assert_eq!(gated.distributions_not_started, 1);
    assert!(sender.calls().is_empty());

    let ungated = dispatch(&store, &sender, settings()).run_cycle(now).await;
    assert_eq!(ungated.sent, 1);
}

#[tokio::test(start_paused = true)]
async fn run_stops_on_cancel_and_first_cycle_is_immediate() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    let now = Utc::now();
    store.add_distribution(now - ChronoDuration::minutes(1), now + ChronoDuration::hours(1), "t", "vip");
    let c = store.add_client("79000000001", "vip");

    let looper = Arc::new(dispatch(&store, &sender, settings()));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let looper = looper.clone();
        let cancel = cancel.clone();
        async move { looper.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sender.calls_for(c.id), 1);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancelled_cycle_records_in_flight_sends_and_starts_no_more() {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(MockSender::new());
    sender.set_delay(Duration::from_secs(1));
    let now = Utc::now();
    let d = store.add_distribution(now - ChronoDuration::minutes(1), now + ChronoDuration::hours(1), "t", "vip");
    for i in 0..4 {
        store.add_client(&format!("7900000000{i}"), "vip");
    }

    let looper = Arc::new(dispatch(&store, &sender, DispatchSettings { max_concurrent_sends: 2, ..settings() }));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let looper = looper.clone();
        let cancel = cancel.clone();
        async move { looper.run(cancel).await }
    });

    // First two sends are in flight.
    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let statuses: Vec<SendStatus> = store.messages().iter().map(|m| m.send_status).collect();
    assert_eq!(statuses.iter().filter(|s| **s == SendStatus::Sent).count(), 2);
    assert_eq!(statuses.iter().filter(|s| **s == SendStatus::NotSent).count(), 2);
    assert_eq!(sender.calls().len(), 2);
    assert!(store.messages().iter().all(|m| m.distribution_id == d.id));
}
