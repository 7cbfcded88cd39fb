// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git branch snapshots.
//!
//! Branch info comes from a single `git status --porcelain=2 --branch`
//! call per working directory, cached with a short TTL so one hook event
//! never issues more than one git invocation per tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::subprocess::{run_with_timeout, GIT_STATUS_TIMEOUT};

/// Cache TTL for branch snapshots.
const BRANCH_TTL: Duration = Duration::from_secs(2);

/// TTL cache of current-branch lookups keyed by working directory.
pub struct BranchCache {
    inner: Mutex<HashMap<PathBuf, (Instant, Option<String>)>>,
}

impl Default for BranchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Current branch of the repository at `dir`, or `None` when `dir` is
    /// not inside a work tree (or git is unavailable).
    pub fn current_branch(&self, dir: &Path) -> Option<String> {
        {
            let cache = self.inner.lock();
            if let Some((at, branch)) = cache.get(dir) {
                if at.elapsed() < BRANCH_TTL {
                    return branch.clone();
                }
            }
        }

        let branch = query_branch(dir);
        self.inner
            .lock()
            .insert(dir.to_path_buf(), (Instant::now(), branch.clone()));
        branch
    }

    /// Drop every cached snapshot (the daemon calls this when a watcher
    /// reports the tree changed).
    pub fn invalidate(&self) {
        self.inner.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn prime(&self, dir: &Path, branch: Option<String>) {
        self.inner
            .lock()
            .insert(dir.to_path_buf(), (Instant::now(), branch));
    }
}

/// One `git status --porcelain=2 --branch` call, parsing `# branch.head`.
///
/// Bounded: a wedged git (e.g. a stuck index lock) degrades to "no
/// branch info" instead of stalling the hook.
fn query_branch(dir: &Path) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.args(["status", "--porcelain=2", "--branch"])
        .current_dir(dir);
    let output = match run_with_timeout(cmd, GIT_STATUS_TIMEOUT, "git status") {
        Ok(output) => output,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "git status failed");
            return None;
        }
    };
    if !output.status.success() {
        debug!(dir = %dir.display(), "git status failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            let head = head.trim();
            // "(detached)" is not a branch
            if head.starts_with('(') {
                return None;
            }
            return Some(head.to_string());
        }
    }
    None
}

/// Find the git work tree containing `path`, walking up from its parent.
///
/// Returns the work tree root. Submodules have a `.git` file rather than
/// a directory; both count.
pub fn enclosing_work_tree(path: &Path) -> Option<PathBuf> {
    let start = if path.is_dir() { path } else { path.parent()? };
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
