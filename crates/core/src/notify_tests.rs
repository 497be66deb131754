// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn publish_wakes_subscriber() {
    let notifier = ChangeNotifier::new();
    let mut sub = notifier.subscribe(EVENTS_CHANNEL);

    notifier.publish(EVENTS_CHANNEL);

    let wake = tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .unwrap();
    assert_eq!(wake, Some(Wake { seq: 1 }));
}

#[tokio::test]
async fn publishes_coalesce_into_one_wake() {
    let notifier = ChangeNotifier::new();
    let mut sub = notifier.subscribe(EVENTS_CHANNEL);

    notifier.publish(EVENTS_CHANNEL);
    notifier.publish(EVENTS_CHANNEL);
    notifier.publish(EVENTS_CHANNEL);

    assert_eq!(sub.recv().await, Some(Wake { seq: 3 }));
    assert!(!sub.has_pending());
}

#[tokio::test]
async fn other_channels_do_not_wake() {
    let notifier = ChangeNotifier::new();
    let mut sub = notifier.subscribe(EVENTS_CHANNEL);

    notifier.publish("audit");

    let res = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
    assert!(res.is_err(), "subscriber on another channel must not wake");
}

#[tokio::test]
async fn every_subscriber_is_woken() {
    let notifier = ChangeNotifier::new();
    let mut a = notifier.subscribe(EVENTS_CHANNEL);
    let mut b = notifier.clone().subscribe(EVENTS_CHANNEL);
    assert_eq!(notifier.subscriber_count(EVENTS_CHANNEL), 2);

    notifier.publish(EVENTS_CHANNEL);

    assert!(a.recv().await.is_some());
    assert!(b.recv().await.is_some());
}

#[tokio::test]
async fn late_subscriber_ignores_earlier_publishes() {
    let notifier = ChangeNotifier::new();
    notifier.publish(EVENTS_CHANNEL);

    let sub = notifier.subscribe(EVENTS_CHANNEL);
    assert!(!sub.has_pending());
}

#[tokio::test]
async fn dropped_subscription_is_not_counted() {
    let notifier = ChangeNotifier::new();
    let sub = notifier.subscribe(EVENTS_CHANNEL);
    assert_eq!(notifier.subscriber_count(EVENTS_CHANNEL), 1);
    drop(sub);
    assert_eq!(notifier.subscriber_count(EVENTS_CHANNEL), 0);
    // publishing with no subscribers is fine
    notifier.publish(EVENTS_CHANNEL);
}

#[tokio::test]
async fn recv_ends_when_notifier_is_dropped() {
    let notifier = ChangeNotifier::new();
    let mut sub = notifier.subscribe(EVENTS_CHANNEL);
    drop(notifier);
    assert_eq!(sub.recv().await, None);
}
