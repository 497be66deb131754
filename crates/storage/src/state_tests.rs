// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{DateTime, Duration, Utc};
use evr_core::{EventType, NewEvent};
use proptest::prelude::*;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs)
}

fn event(id: &str, source: &str, secs: i64) -> Event {
    Event::from_new(
        id.to_string(),
        NewEvent::new(source, format!("{}-res", id), EventType::Create),
        at(secs),
    )
}

#[test]
fn append_and_lookup_event() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::EventAppend {
        event: event("e1", "Widgets", 1),
    });

    assert_eq!(state.events().len(), 1);
    assert_eq!(state.event("e1").map(|e| e.source.as_str()), Some("Widgets"));
    assert!(state.event("missing").is_none());
}

#[test]
fn duplicate_append_is_ignored() {
    let mut state = MaterializedState::default();
    let op = Operation::EventAppend {
        event: event("e1", "Widgets", 1),
    };
    state.apply(&op);
    state.apply(&op);
    assert_eq!(state.events().len(), 1);
}

#[test]
fn reconciled_event_leaves_pending_list() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::EventAppend {
        event: event("e1", "Widgets", 1),
    });
    state.apply(&Operation::EventAppend {
        event: event("e2", "Widgets", 2),
    });
    state.apply(&Operation::EventReconciled {
        id: "e1".to_string(),
        at: at(3),
    });

    let pending: Vec<_> = state.unreconciled(None).into_iter().map(|e| e.id).collect();
    assert_eq!(pending, vec!["e2"]);
    assert_eq!(state.event("e1").and_then(|e| e.reconciled_at), Some(at(3)));
}

#[test]
fn second_reconcile_keeps_first_timestamp() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::EventAppend {
        event: event("e1", "Widgets", 1),
    });
    for secs in [5, 9] {
        state.apply(&Operation::EventReconciled {
            id: "e1".to_string(),
            at: at(secs),
        });
    }
    assert_eq!(state.event("e1").and_then(|e| e.reconciled_at), Some(at(5)));
}

#[test]
fn unreconciled_filters_by_source() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::EventAppend {
        event: event("e1", "Widgets", 1),
    });
    state.apply(&Operation::EventAppend {
        event: event("e2", "Gadgets", 2),
    });

    let widgets = state.unreconciled(Some("Widgets"));
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].id, "e1");
    assert_eq!(state.unreconciled(Some("Nothing")).len(), 0);
}

#[test]
fn soft_delete_hides_resource_from_listing() {
    let mut state = MaterializedState::default();
    let widget = Resource::new("w-1", "Widgets", serde_json::json!({"species": "A"}), at(1));
    state.apply(&Operation::ResourcePut { resource: widget });
    assert_eq!(state.resources_of("Widgets").len(), 1);

    state.apply(&Operation::ResourceDelete {
        kind: "Widgets".to_string(),
        id: "w-1".to_string(),
        at: at(2),
    });

    assert!(state.resources_of("Widgets").is_empty());
    let kept = state.resource("Widgets", "w-1").unwrap();
    assert_eq!(kept.deleted_at, Some(at(2)));
}

proptest! {
    #[test]
    fn unreconciled_is_sorted_by_creation(offsets in proptest::collection::vec(0i64..50, 0..30)) {
        let mut state = MaterializedState::default();
        for (i, secs) in offsets.iter().enumerate() {
            state.apply(&Operation::EventAppend { event: event(&format!("e{}", i), "Widgets", *secs) });
        }

        let pending = state.unreconciled(None);
        prop_assert_eq!(pending.len(), offsets.len());
        for pair in pending.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at, "pending events out of order");
        }
    }
}
