// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handler context.

use ccs_core::{ProjectPaths, SessionsConfig};
use ccs_state::{ConfigError, ConfigStore, StateError, StateStore};
use thiserror::Error;

use crate::git::BranchCache;
use crate::oplog::OpLog;
use crate::transcript::TailCache;

/// Errors surfaced by engine handlers.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transcript lock timeout for target {target}")]
    TranscriptLockTimeout { target: String },
}

/// Everything a hook handler needs for one project.
///
/// The daemon holds one per project and reuses the caches across
/// requests; the legacy shim path builds a fresh one per invocation.
pub struct EnforceCtx {
    pub paths: ProjectPaths,
    pub state: StateStore,
    pub config: SessionsConfig,
    pub branches: BranchCache,
    pub transcript_tails: TailCache,
    pub oplog: OpLog,
    config_mtime: Option<std::time::SystemTime>,
}

impl EnforceCtx {
    pub fn new(paths: ProjectPaths) -> Result<Self, EngineError> {
        let state = StateStore::new(&paths);
        let config = ConfigStore::new(&paths).load()?;
        let config_mtime = file_mtime(&paths.config_file());
        let oplog = OpLog::from_env(&paths);
        Ok(Self {
            paths,
            state,
            config,
            branches: BranchCache::new(),
            transcript_tails: TailCache::new(),
            oplog,
            config_mtime,
        })
    }

    /// Re-read the config unconditionally.
    pub fn reload_config(&mut self) -> Result<(), EngineError> {
        self.config = ConfigStore::new(&self.paths).load()?;
        self.config_mtime = file_mtime(&self.paths.config_file());
        Ok(())
    }

    /// Cheap invalidation check for long-lived holders (the daemon): one
    /// stat, and a reload only when the file changed on disk.
    pub fn refresh_config_if_stale(&mut self) {
        let current = file_mtime(&self.paths.config_file());
        if current != self.config_mtime {
            if let Err(e) = self.reload_config() {
                tracing::warn!(error = %e, "config reload failed; keeping cached copy");
            }
        }
    }

    /// Classifier options derived from config.
    pub fn classify_options(&self) -> ccs_shell::ClassifyOptions {
        ccs_shell::ClassifyOptions {
            extrasafe: self.config.extrasafe,
            read_patterns: self.config.read_patterns.clone(),
            write_patterns: self.config.write_patterns.clone(),
        }
    }
}

fn file_mtime(path: &std::path::Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
