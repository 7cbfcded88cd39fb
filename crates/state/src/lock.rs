// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process advisory lock.
//!
//! Acquisition is the atomic creation of a named directory holding an
//! owner descriptor (`lock_info.json`). Stale locks — owner dead, or the
//! descriptor older than [`LOCK_STALE_AFTER`] — are reaped and retried.
//! Re-entry by the owning process is a programmer error and fails
//! immediately rather than self-deadlocking.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// A lock older than this is presumed abandoned.
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// Acquisition poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Total acquisition budget.
const ACQUIRE_BUDGET: Duration = Duration::from_secs(1);

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("state lock held by this process (pid {pid}); re-entrant acquisition is a bug")]
    Reentry { pid: u32 },

    #[error("timed out acquiring state lock at {path} (held by pid {holder:?})")]
    Timeout { path: PathBuf, holder: Option<u32> },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Owner descriptor written inside the lock directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    /// Wall-clock acquisition time, epoch seconds.
    pub timestamp: i64,
    pub host: String,
}

impl LockInfo {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            timestamp: chrono::Utc::now().timestamp(),
            host: hostname(),
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

/// True when `pid` refers to a live process. EPERM means the process
/// exists but belongs to another user, which still counts as alive.
fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// The advisory directory lock.
pub struct StateLock {
    dir: PathBuf,
}

/// Holds the lock until dropped.
pub struct LockGuard {
    dir: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Release explicitly (also happens on drop).
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = std::fs::remove_dir_all(&self.dir) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.dir.display(), error = %e, "failed to release state lock");
                }
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

impl StateLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Acquire the lock, polling within the acquisition budget.
    pub fn acquire(&self) -> Result<LockGuard, LockError> {
        let deadline = Instant::now() + ACQUIRE_BUDGET;
        let mut last_holder = None;

        loop {
            match self.try_acquire() {
                Ok(guard) => return Ok(guard),
                Err(LockError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                    match self.read_owner() {
                        Some(info) if info.pid == std::process::id() => {
                            return Err(LockError::Reentry { pid: info.pid });
                        }
                        Some(info) => {
                            last_holder = Some(info.pid);
                            if is_stale(&info) {
                                warn!(
                                    path = %self.dir.display(),
                                    pid = info.pid,
                                    "reaping stale state lock"
                                );
                                let _ = std::fs::remove_dir_all(&self.dir);
                                continue;
                            }
                        }
                        // Descriptor not yet written or unreadable; treat as
                        // contended and retry within the budget.
                        None => {}
                    }
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(LockError::Timeout {
                    path: self.dir.clone(),
                    holder: last_holder,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn try_acquire(&self) -> Result<LockGuard, LockError> {
        if let Some(parent) = self.dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir(&self.dir)?;

        let info = LockInfo::current();
        let body = serde_json::to_vec_pretty(&info).unwrap_or_default();
        std::fs::write(self.dir.join("lock_info.json"), body)?;

        Ok(LockGuard {
            dir: self.dir.clone(),
            released: false,
        })
    }

    fn read_owner(&self) -> Option<LockInfo> {
        let raw = std::fs::read_to_string(self.dir.join("lock_info.json")).ok()?;
        serde_json::from_str(&raw).ok()
    }
}

fn is_stale(info: &LockInfo) -> bool {
    if !pid_alive(info.pid) {
        return true;
    }
    let age = chrono::Utc::now().timestamp() - info.timestamp;
    age >= LOCK_STALE_AFTER.as_secs() as i64
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
