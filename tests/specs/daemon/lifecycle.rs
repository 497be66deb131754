//! evrd lifecycle: startup, reconciling CLI writes, signal shutdown

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

/// Start evrd on the state directory and wait for it to print READY.
///
/// The rescan interval stays at its 30s default, so the waits below only
/// pass if CLI writes wake the daemon.
fn start_daemon(state: &StateDir) -> Child {
    std::fs::write(state.path().join("evrd.toml"), "managers = 2\n").unwrap();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("evrd"))
        .arg(state.path())
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "READY");
    child
}

fn stop_daemon(mut child: Child) {
    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    let status = child.wait().unwrap();
    assert!(status.success(), "evrd exited with {:?}", status);
}

fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < limit, "condition not reached in {:?}", limit);
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn daemon_writes_pid_file_and_removes_it_on_sigterm() {
    let state = StateDir::empty();
    let daemon = start_daemon(&state);

    let pid = std::fs::read_to_string(state.path().join("evrd.pid")).unwrap();
    assert_eq!(pid.trim(), daemon.id().to_string());

    stop_daemon(daemon);
    assert!(!state.path().join("evrd.pid").exists());

    let log = std::fs::read_to_string(state.path().join("evrd.log")).unwrap();
    assert!(log.contains("--- evrd: starting (pid: "));
}

#[test]
fn second_daemon_refuses_to_start() {
    let state = StateDir::empty();
    let daemon = start_daemon(&state);

    let status = std::process::Command::new(assert_cmd::cargo::cargo_bin("evrd"))
        .arg(state.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());

    stop_daemon(daemon);
}

#[test]
fn daemon_reconciles_widgets_written_by_the_cli() {
    let state = StateDir::empty();
    let daemon = start_daemon(&state);

    let id = state.create("Widgets", r#"{"species":"A"}"#);
    let mirror = state.path().join("widgets").join(format!("{id}.json"));
    wait_for(Duration::from_secs(10), || mirror.exists());

    state
        .evr()
        .args(&["resource", "delete", "Widgets", &id])
        .passes();
    wait_for(Duration::from_secs(10), || !mirror.exists());

    wait_for(Duration::from_secs(10), || {
        state
            .evr()
            .args(&["events", "list", "--pending"])
            .passes()
            .stdout()
            .contains("No events found.")
    });

    stop_daemon(daemon);
}
