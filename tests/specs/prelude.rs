//! Shared helpers for CLI specs

use std::path::{Path, PathBuf};
use std::process::Output;

pub use assert_cmd::Command;
pub use serde_json::{json, Value};

/// Temporary state directory shared by every command of one spec
pub struct StateDir {
    dir: tempfile::TempDir,
}

impl StateDir {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.path().join("locks")
    }

    /// `evr` bound to this state directory
    pub fn evr(&self) -> Cli {
        let mut cmd = Command::cargo_bin("evr").unwrap();
        cmd.env("EVR_STATE_DIR", self.path()).env_remove("RUST_LOG");
        Cli { cmd }
    }

    /// Create a resource and return its id
    pub fn create(&self, kind: &str, spec: &str) -> String {
        let out = self
            .evr()
            .args(&["-o", "json", "resource", "create", kind, spec])
            .passes()
            .json();
        out["id"].as_str().unwrap().to_string()
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    pub fn fails_with(mut self, code: i32) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "stdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }

    pub fn fails(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(!run.output.status.success(), "expected failure\nstdout: {}", run.stdout());
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout lacks {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(needle), "stdout has {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr lacks {:?}:\n{}", needle, stderr);
        self
    }
}
