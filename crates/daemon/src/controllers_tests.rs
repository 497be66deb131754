// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use evr_core::{Event, NewEvent, Resource};
use evr_storage::{MemoryStore, Transaction};
use serde_json::json;
use tempfile::tempdir;

fn context(event_type: EventType, id: &str) -> HandlerContext {
    HandlerContext {
        event: Event::from_new(
            "evt-1".to_string(),
            NewEvent::new(WIDGETS, id, event_type),
            Utc::now(),
        ),
        manager: "test".to_string(),
    }
}

fn put_widget(store: &MemoryStore, id: &str, species: &str) {
    let widget = Resource::new(id, WIDGETS, json!({ "species": species }), store.now());
    store
        .commit(Transaction::new().put_resource(widget))
        .unwrap();
}

#[tokio::test]
async fn upsert_mirrors_current_state() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new();
    let registry = registry(store.clone(), dir.path()).unwrap();
    put_widget(&store, "w-1", "A");

    let upsert = &registry.chain(WIDGETS, EventType::Create)[0];
    upsert
        .handle(&context(EventType::Create, "w-1"), "w-1")
        .await
        .unwrap();
    // Running twice converges on the same file
    put_widget(&store, "w-1", "B");
    upsert
        .handle(&context(EventType::Update, "w-1"), "w-1")
        .await
        .unwrap();

    let body = std::fs::read_to_string(dir.path().join("w-1.json")).unwrap();
    let mirrored: Resource = serde_json::from_str(&body).unwrap();
    assert_eq!(mirrored.spec, json!({"species": "B"}));
}

#[tokio::test]
async fn upsert_of_missing_widget_is_a_no_op() {
    let dir = tempdir().unwrap();
    let registry = registry(MemoryStore::new(), dir.path()).unwrap();

    let upsert = &registry.chain(WIDGETS, EventType::Update)[0];
    upsert
        .handle(&context(EventType::Update, "w-9"), "w-9")
        .await
        .unwrap();
    assert!(!dir.path().join("w-9.json").exists());
}

#[tokio::test]
async fn delete_removes_mirror_and_tolerates_repeats() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new();
    let registry = registry(store.clone(), dir.path()).unwrap();
    put_widget(&store, "w-1", "A");
    registry.chain(WIDGETS, EventType::Create)[0]
        .handle(&context(EventType::Create, "w-1"), "w-1")
        .await
        .unwrap();

    let remove = &registry.chain(WIDGETS, EventType::Delete)[0];
    for _ in 0..2 {
        remove
            .handle(&context(EventType::Delete, "w-1"), "w-1")
            .await
            .unwrap();
    }
    assert!(!dir.path().join("w-1.json").exists());
}

#[tokio::test]
async fn store_failure_fails_the_upsert() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new();
    let registry = registry(store.clone(), dir.path()).unwrap();
    store.set_available(false);

    let err = registry.chain(WIDGETS, EventType::Create)[0]
        .handle(&context(EventType::Create, "w-1"), "w-1")
        .await
        .unwrap_err();
    assert_eq!(err.message(), "widget lookup failed");
}
