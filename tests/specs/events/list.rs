//! Event log listing

use crate::prelude::*;

#[test]
fn writes_append_events_in_order() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);
    state
        .evr()
        .args(&["resource", "replace", "Widgets", &id, r#"{"species":"B"}"#])
        .passes();
    state
        .evr()
        .args(&["resource", "delete", "Widgets", &id])
        .passes();

    let events = state
        .evr()
        .args(&["-o", "json", "events", "list"])
        .passes()
        .json();
    let types: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["Create", "Update", "Delete"]);
    assert!(events.as_array().unwrap().iter().all(|e| e["source_id"] == id.as_str()));
}

#[test]
fn text_listing_marks_events_pending() {
    let state = StateDir::empty();
    state.create("Widgets", r#"{"species":"A"}"#);

    state
        .evr()
        .args(&["events", "list"])
        .passes()
        .stdout_has("Widgets")
        .stdout_has("pending");
}

#[test]
fn source_filter_limits_the_listing() {
    let state = StateDir::empty();
    state.create("Widgets", r#"{"n":1}"#);
    state.create("Gadgets", r#"{"n":2}"#);

    state
        .evr()
        .args(&["events", "list", "--pending", "--source", "Gadgets"])
        .passes()
        .stdout_has("Gadgets")
        .stdout_lacks("Widgets");
}

#[test]
fn empty_log_says_so() {
    let state = StateDir::empty();
    state
        .evr()
        .args(&["events", "list"])
        .passes()
        .stdout_has("No events found.");
}
