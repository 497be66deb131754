// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn pending(created_at: DateTime<Utc>) -> Event {
    Event::from_new(
        "evt-1".to_string(),
        NewEvent::new("Widgets", "w-1", EventType::Create),
        created_at,
    )
}

#[parameterized(
    create = { "Create", EventType::Create },
    update_lower = { "update", EventType::Update },
    delete_upper = { "DELETE", EventType::Delete },
)]
fn event_type_parses(input: &str, expected: EventType) {
    assert_eq!(input.parse::<EventType>(), Ok(expected));
}

#[test]
fn unknown_event_type_is_rejected() {
    let err = "upsert".parse::<EventType>().unwrap_err();
    assert_eq!(err.to_string(), "unknown event type: upsert");
}

#[test]
fn new_event_starts_pending() {
    let now = Utc::now();
    let event = pending(now);
    assert!(!event.is_reconciled());
    assert_eq!(event.created_at, now);
    assert_eq!(event.updated_at, now);
    assert!(event.deleted_at.is_none());
}

#[test]
fn reconcile_only_once() {
    let now = Utc::now();
    let mut event = pending(now);

    let first = now + chrono::Duration::seconds(5);
    assert!(event.reconcile(first));
    assert_eq!(event.reconciled_at, Some(first));

    assert!(!event.reconcile(first + chrono::Duration::seconds(5)));
    assert_eq!(event.reconciled_at, Some(first));
}

#[test]
fn reconcile_never_precedes_creation() {
    let now = Utc::now();
    let mut event = pending(now);
    assert!(event.reconcile(now - chrono::Duration::seconds(30)));
    assert_eq!(event.reconciled_at, Some(now));
}

#[test]
fn event_serializes_with_snake_case_fields() {
    let event = pending(DateTime::<Utc>::UNIX_EPOCH);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["source_id"], "w-1");
    assert_eq!(json["event_type"], "Create");
    assert!(json["reconciled_at"].is_null());
    assert!(json.get("deleted_at").is_none());

    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}

proptest::proptest! {
    #[test]
    fn reconciled_at_is_never_before_created_at(offset in -1_000_000i64..1_000_000) {
        let created = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_000);
        let mut event = pending(created);
        event.reconcile(created + chrono::Duration::seconds(offset));

        let reconciled = event.reconciled_at.unwrap();
        proptest::prop_assert!(reconciled >= event.created_at);
        proptest::prop_assert_eq!(event.updated_at, reconciled);
    }

    #[test]
    fn event_type_parse_ignores_case(upper in proptest::collection::vec(proptest::bool::ANY, 6)) {
        for event_type in EventType::ALL {
            let mixed: String = event_type
                .as_str()
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
                .collect();
            proptest::prop_assert_eq!(mixed.parse::<EventType>(), Ok(event_type));
        }
    }
}
