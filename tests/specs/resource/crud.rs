//! Resource create/replace/delete/get/list

use crate::prelude::*;

#[test]
fn create_then_get_round_trips_the_spec() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);

    let got = state
        .evr()
        .args(&["-o", "json", "resource", "get", "Widgets", &id])
        .passes()
        .json();
    assert_eq!(got["spec"], json!({"species": "A"}));
    assert_eq!(got["kind"], "Widgets");
}

#[test]
fn replace_updates_the_spec() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);

    state
        .evr()
        .args(&["resource", "replace", "Widgets", &id, r#"{"species":"B"}"#])
        .passes()
        .stdout_has(r#""species":"B""#);
}

#[test]
fn list_shows_only_live_resources_of_the_kind() {
    let state = StateDir::empty();
    let keep = state.create("Widgets", r#"{"n":1}"#);
    let gone = state.create("Widgets", r#"{"n":2}"#);
    state.create("Gadgets", r#"{"n":3}"#);
    state
        .evr()
        .args(&["resource", "delete", "Widgets", &gone])
        .passes()
        .stdout_has("deleted Widgets");

    let listed = state
        .evr()
        .args(&["-o", "json", "resource", "list", "Widgets"])
        .passes()
        .json();
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![keep.as_str()]);
}

#[test]
fn empty_list_says_so() {
    let state = StateDir::empty();
    state
        .evr()
        .args(&["resource", "list", "Widgets"])
        .passes()
        .stdout_has("No Widgets found.");
}

#[test]
fn get_after_delete_is_not_found() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);
    state
        .evr()
        .args(&["resource", "delete", "Widgets", &id])
        .passes();

    state
        .evr()
        .args(&["resource", "get", "Widgets", &id])
        .fails_with(3)
        .stderr_has("not found")
        .stderr_has("evr resource list Widgets");
}

#[test]
fn replace_of_missing_resource_is_not_found() {
    let state = StateDir::empty();
    state
        .evr()
        .args(&["resource", "replace", "Widgets", "nope", r#"{"species":"A"}"#])
        .fails_with(3);
}

#[test]
fn invalid_json_spec_is_rejected() {
    let state = StateDir::empty();
    state
        .evr()
        .args(&["resource", "create", "Widgets", "species=A"])
        .fails_with(1)
        .stderr_has("spec is not valid JSON");
}
