// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log shared by every process that opens the same file
//!
//! One line per commit. Writers hold an exclusive file lock while they catch
//! up and append, so lines from different processes never interleave.
//! Readers only consume newline-terminated lines and can tail without the lock.

use evr_core::Operation;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted entry at byte {offset}: {reason}")]
    Corrupted { offset: u64, reason: String },
}

/// One committed batch of operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub ops: Vec<Operation>,
    /// CRC32 of the serialized operations
    pub checksum: u32,
}

impl WalEntry {
    pub fn new(seq: u64, ops: Vec<Operation>) -> Self {
        let checksum = Self::calculate_checksum(&ops);
        Self { seq, ops, checksum }
    }

    fn calculate_checksum(ops: &[Operation]) -> u32 {
        let json = serde_json::to_string(ops).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the operations
    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.ops)
    }
}

/// Exclusive writer lock on the WAL file; released on drop
pub struct WalLock {
    file: File,
}

impl Drop for WalLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to unlock WAL");
        }
    }
}

/// Append-only log handle with a read cursor
pub struct Wal {
    path: PathBuf,
    file: File,
    /// Bytes of the file already consumed by this handle
    offset: u64,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path. Nothing is read yet; call
    /// [`Wal::read_new`] to catch up.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset: 0,
            sequence: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest sequence number seen by this handle
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Take the exclusive writer lock, blocking until it is free
    pub fn lock(&self) -> Result<WalLock, WalError> {
        let file = self.file.try_clone()?;
        file.lock_exclusive()?;
        Ok(WalLock { file })
    }

    /// Read complete entries appended since the last call
    pub fn read_new(&mut self) -> Result<Vec<WalEntry>, WalError> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(self.offset))?;

        let mut entries = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 || line.last() != Some(&b'\n') {
                // EOF, or a line still being written
                break;
            }

            let start = self.offset;
            self.offset += n as u64;

            let body = &line[..n - 1];
            if body.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let entry: WalEntry =
                serde_json::from_slice(body).map_err(|e| WalError::Corrupted {
                    offset: start,
                    reason: e.to_string(),
                })?;
            if !entry.verify() {
                return Err(WalError::Corrupted {
                    offset: start,
                    reason: "checksum mismatch".to_string(),
                });
            }

            self.sequence = self.sequence.max(entry.seq);
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Append a batch as one entry.
    ///
    /// The caller must hold [`Wal::lock`] and have caught up with
    /// [`Wal::read_new`]; an unterminated tail left by a crashed writer is
    /// truncated first.
    pub fn append(&mut self, ops: Vec<Operation>) -> Result<WalEntry, WalError> {
        let len = self.file.metadata()?.len();
        if len > self.offset {
            tracing::warn!(
                path = %self.path.display(),
                torn_bytes = len - self.offset,
                "truncating torn WAL tail"
            );
            self.file.set_len(self.offset)?;
        }

        let entry = WalEntry::new(self.sequence + 1, ops);
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.sync_data()?;

        self.sequence = entry.seq;
        self.offset += line.len() as u64;
        Ok(entry)
    }

    /// Replay every entry from the log
    pub fn replay(path: &Path) -> Result<Vec<WalEntry>, WalError> {
        match File::open(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }
        Wal::open(path)?.read_new()
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
