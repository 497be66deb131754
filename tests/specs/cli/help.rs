//! Help and argument errors

use crate::prelude::*;
use predicates::prelude::*;

#[test]
fn help_lists_command_groups() {
    let state = StateDir::empty();
    let mut cmd = Command::cargo_bin("evr").unwrap();
    cmd.env("EVR_STATE_DIR", state.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resource"))
        .stdout(predicate::str::contains("events"))
        .stdout(predicate::str::contains("reconcile"));
}

#[test]
fn unknown_lock_mode_is_a_usage_error() {
    let state = StateDir::empty();
    state
        .evr()
        .args(&["--lock-mode", "sometimes", "resource", "list", "Widgets"])
        .fails_with(2)
        .stderr_has("unknown lock mode");
}
