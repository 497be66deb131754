//! One-shot reconcile from the CLI

use crate::prelude::*;

#[test]
fn reconcile_runs_the_daemon_widget_controller() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);

    let summary = state
        .evr()
        .args(&["-o", "json", "reconcile"])
        .passes()
        .json();
    assert_eq!(summary["reconciled"], 1);
    assert_eq!(summary["sources"], json!(["Widgets"]));

    // Same effect evrd's controller would have had
    let mirror = state.path().join("widgets").join(format!("{id}.json"));
    let body: Value = serde_json::from_str(&std::fs::read_to_string(&mirror).unwrap()).unwrap();
    assert_eq!(body["spec"], json!({"species": "A"}));

    state.evr().args(&["resource", "delete", "Widgets", &id]).passes();
    state.evr().args(&["reconcile"]).passes().stdout_has("reconciled 1");
    assert!(!mirror.exists());
}

#[test]
fn reconcile_leaves_events_without_a_controller_pending() {
    let state = StateDir::empty();
    state.create("Widgets", r#"{"n":1}"#);
    state.create("Gadgets", r#"{"n":2}"#);

    state
        .evr()
        .args(&["reconcile"])
        .passes()
        .stdout_has("reconciled 1 skipped 0 failed 0 (unhandled 1)");

    state
        .evr()
        .args(&["events", "list", "--pending"])
        .passes()
        .stdout_has("Gadgets")
        .stdout_lacks("Widgets");
}

#[test]
fn dry_run_reconciles_nothing() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"n":1}"#);
    state.create("Gadgets", r#"{"n":2}"#);

    state
        .evr()
        .args(&["reconcile", "--dry-run"])
        .passes()
        .stdout_has("would dispatch 1 (unhandled 1)");

    state
        .evr()
        .args(&["events", "list", "--pending"])
        .passes()
        .stdout_has("Widgets")
        .stdout_has("Gadgets");
    assert!(!state.path().join("widgets").join(format!("{id}.json")).exists());
}

#[test]
fn reconcile_is_a_no_op_when_nothing_is_pending() {
    let state = StateDir::empty();
    state.create("Widgets", r#"{"n":1}"#);
    state.evr().args(&["reconcile"]).passes();

    state
        .evr()
        .args(&["reconcile"])
        .passes()
        .stdout_has("reconciled 0 skipped 0 failed 0");
}
