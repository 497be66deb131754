// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory layout shared by `evr` and `evrd`

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the state directory
pub const STATE_DIR_ENV: &str = "EVR_STATE_DIR";

/// Event store directory, relative to the state directory
pub const DATA_DIR: &str = "data";

/// Advisory lock files, relative to the state directory
pub const LOCKS_DIR: &str = "locks";

/// Resolve the state directory.
///
/// Order: `explicit`, `EVR_STATE_DIR`, `XDG_STATE_HOME/evr`,
/// `~/.local/state/evr`. Empty variables count as unset. `None` when no
/// candidate exists.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    resolve_state_dir_with(explicit, |key| std::env::var_os(key))
}

/// [`resolve_state_dir`] with a custom environment lookup
pub fn resolve_state_dir_with(
    explicit: Option<PathBuf>,
    env: impl Fn(&str) -> Option<OsString>,
) -> Option<PathBuf> {
    let var = |key: &str| env(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    explicit
        .or_else(|| var(STATE_DIR_ENV))
        .or_else(|| var("XDG_STATE_HOME").map(|xdg| xdg.join("evr")))
        .or_else(|| var("HOME").map(|home| home.join(".local/state/evr")))
}
