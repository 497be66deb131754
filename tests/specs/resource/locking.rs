//! Lock modes as seen from the CLI

use crate::prelude::*;
use evr_core::LockKey;
use fs2::FileExt;

/// Take the advisory lock for a resource the way another process would
fn hold_lock(state: &StateDir, kind: &str, id: &str) -> std::fs::File {
    std::fs::create_dir_all(state.locks_dir()).unwrap();
    let path = state
        .locks_dir()
        .join(format!("{}.lock", LockKey::new(id, kind).digest()));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .unwrap();
    file.try_lock_exclusive().unwrap();
    file
}

#[test]
fn non_blocking_replace_conflicts_while_locked() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);
    let held = hold_lock(&state, "Widgets", &id);

    state
        .evr()
        .args(&[
            "--lock-mode",
            "non-blocking",
            "resource",
            "replace",
            "Widgets",
            &id,
            r#"{"species":"B"}"#,
        ])
        .fails_with(2)
        .stderr_has("locked by another writer");

    drop(held);
    state
        .evr()
        .args(&[
            "--lock-mode",
            "non-blocking",
            "resource",
            "replace",
            "Widgets",
            &id,
            r#"{"species":"B"}"#,
        ])
        .passes();
}

#[test]
fn disabled_lock_mode_writes_through_a_held_lock() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);
    let _held = hold_lock(&state, "Widgets", &id);

    state
        .evr()
        .args(&[
            "--lock-mode",
            "disabled",
            "resource",
            "replace",
            "Widgets",
            &id,
            r#"{"species":"B"}"#,
        ])
        .passes()
        .stdout_has(r#""species":"B""#);
}

#[test]
fn replace_with_same_spec_emits_no_event() {
    let state = StateDir::empty();
    let id = state.create("Widgets", r#"{"species":"A"}"#);
    state
        .evr()
        .args(&["resource", "replace", "Widgets", &id, r#"{"species":"A"}"#])
        .passes();

    let events = state
        .evr()
        .args(&["-o", "json", "events", "list"])
        .passes()
        .json();
    assert_eq!(events.as_array().unwrap().len(), 1);
}
