// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-root discovery and the on-disk layout of sessions data.
//!
//! State is scoped per project by a short hash of the canonicalized root
//! so that two checkouts of the same repository never share a record.

use std::path::{Path, PathBuf};

/// Hex length of the project id (md5 prefix).
pub const PROJECT_ID_LEN: usize = 12;

/// Resolved locations of everything cc-sessions persists for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    project_id: String,
}

impl ProjectPaths {
    /// Build paths for a project root. The root is canonicalized when it
    /// exists so the project id is stable across relative invocations.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        let digest = md5::compute(root.to_string_lossy().as_bytes());
        let project_id = format!("{digest:x}")[..PROJECT_ID_LEN].to_string();
        Self { root, project_id }
    }

    /// Discover the project root: `CLAUDE_PROJECT_DIR` if set, else the
    /// nearest ancestor of `cwd` carrying a `sessions/` directory.
    pub fn discover(cwd: &Path) -> Self {
        match std::env::var_os("CLAUDE_PROJECT_DIR") {
            Some(dir) if !dir.is_empty() => Self::new(PathBuf::from(dir)),
            _ => Self::from_cwd(cwd),
        }
    }

    /// Root discovery from a working directory alone, ignoring the
    /// environment. The daemon uses this: it serves many projects and
    /// must not inherit one shim's `CLAUDE_PROJECT_DIR` for all of them.
    pub fn from_cwd(cwd: &Path) -> Self {
        let mut current = Some(cwd);
        while let Some(dir) = current {
            if dir.join("sessions").is_dir() {
                return Self::new(dir);
            }
            current = dir.parent();
        }
        Self::new(cwd)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First 12 hex chars of the md5 of the canonicalized root.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Scoped state directory: `sessions/state/<project-id>/`.
    pub fn state_dir(&self) -> PathBuf {
        self.root
            .join("sessions")
            .join("state")
            .join(&self.project_id)
    }

    /// Un-scoped state directory housing shared orchestration files.
    pub fn shared_state_dir(&self) -> PathBuf {
        self.root.join("sessions").join("state")
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join("sessions-state.json")
    }

    /// Legacy un-scoped state file, migrated on first load.
    pub fn legacy_state_file(&self) -> PathBuf {
        self.shared_state_dir().join("sessions-state.json")
    }

    /// Advisory lock directory, sibling of the state file.
    pub fn lock_dir(&self) -> PathBuf {
        self.state_dir().join("sessions-state.lock")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("sessions").join("sessions-config.json")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("sessions").join("tasks")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.root.join("sessions").join("transcripts")
    }

    /// Per-target transcript chunk directory.
    pub fn transcript_target_dir(&self, target: &str) -> PathBuf {
        self.transcripts_dir().join(target)
    }

    /// Per-target dispatch lock file.
    pub fn transcript_lock_file(&self, target: &str) -> PathBuf {
        self.transcripts_dir()
            .join(".locks")
            .join(format!("{target}.lock"))
    }

    pub fn session_index_file(&self) -> PathBuf {
        self.shared_state_dir().join("session_index.json")
    }

    pub fn execution_plan_file(&self) -> PathBuf {
        self.shared_state_dir().join("execution_plan.json")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
