// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state store: authoritative load/edit access to the persistent
//! sessions state record.
//!
//! Readers load without the lock (atomic replacement guarantees a
//! point-in-time view). All mutation flows through [`StateStore::edit`],
//! which re-reads under the exclusive lock so concurrent writers never
//! lose updates.

use std::path::{Path, PathBuf};

use ccs_core::{ProjectPaths, SessionsState};
use thiserror::Error;
use tracing::{info, warn};

use crate::atomic::write_atomic;
use crate::lock::{LockError, LockGuard, StateLock};

/// Errors from state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store handle for one project's state record.
pub struct StateStore {
    state_file: PathBuf,
    legacy_file: PathBuf,
    lock: StateLock,
    version: String,
}

impl StateStore {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            state_file: paths.state_file(),
            legacy_file: paths.legacy_state_file(),
            lock: StateLock::new(paths.lock_dir()),
            version: ccs_core::VERSION.to_string(),
        }
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Load a deep copy of the current state.
    ///
    /// A missing file materializes (and persists) defaults. A corrupt file
    /// is renamed aside to a `.bad` sibling once and replaced with
    /// defaults.
    pub fn load(&self) -> Result<SessionsState, StateError> {
        self.migrate_legacy();

        match std::fs::read_to_string(&self.state_file) {
            Ok(raw) => match serde_json::from_str::<SessionsState>(&raw) {
                Ok(state) => Ok(state),
                Err(e) => {
                    let bad = self.state_file.with_extension("json.bad");
                    warn!(
                        path = %self.state_file.display(),
                        error = %e,
                        "corrupt state file, renaming aside and reinitializing"
                    );
                    let _ = std::fs::rename(&self.state_file, &bad);
                    self.initialize()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.initialize(),
            Err(e) => Err(e.into()),
        }
    }

    /// Acquire the lock, re-read, apply `f`, persist atomically, release.
    ///
    /// Returns whatever `f` returns. Raises on lock acquisition failure —
    /// the store never hands out stale data on contention.
    pub fn edit<T>(
        &self,
        f: impl FnOnce(&mut SessionsState) -> T,
    ) -> Result<T, StateError> {
        let _guard = self.lock.acquire()?;
        let mut state = self.load()?;
        let result = f(&mut state);
        state.version = self.version.clone();
        self.persist(&state)?;
        Ok(result)
    }

    /// Run `f` while holding the state lock, without an implied re-read or
    /// write. For multi-step updates that interleave other filesystem work.
    pub fn with_lock<T>(
        &self,
        f: impl FnOnce(&StateStore) -> Result<T, StateError>,
    ) -> Result<T, StateError> {
        let _guard = self.lock.acquire()?;
        f(self)
    }

    /// Persist `state` atomically. Callers are expected to hold the lock
    /// when racing writers are possible.
    pub fn persist(&self, state: &SessionsState) -> Result<(), StateError> {
        let body = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.state_file, &body)?;
        Ok(())
    }

    /// Expose the lock for components that serialize multi-step work.
    pub fn acquire_lock(&self) -> Result<LockGuard, StateError> {
        Ok(self.lock.acquire()?)
    }

    fn initialize(&self) -> Result<SessionsState, StateError> {
        let state = SessionsState::new_default();
        self.persist(&state)?;
        Ok(state)
    }

    /// One-time migration from the unscoped legacy location into the
    /// scoped, hash-keyed directory.
    fn migrate_legacy(&self) {
        if self.state_file.exists() || !self.legacy_file.is_file() {
            return;
        }
        if let Some(parent) = self.state_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::rename(&self.legacy_file, &self.state_file) {
            Ok(()) => info!(
                from = %self.legacy_file.display(),
                to = %self.state_file.display(),
                "migrated legacy state file into scoped directory"
            ),
            Err(e) => warn!(
                from = %self.legacy_file.display(),
                error = %e,
                "failed to migrate legacy state file"
            ),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
