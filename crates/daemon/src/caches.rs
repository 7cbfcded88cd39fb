// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot caches with explicit invalidation.
//!
//! State and config flow through the stores (reads hit disk, writes
//! invalidate the per-project context); the git snapshot and transcript
//! tail caches ride inside each project's long-lived engine context.
//! What remains daemon-wide is the task directory listing (5 s TTL).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// TTL for task directory listings.
const TASK_LISTING_TTL: Duration = Duration::from_secs(5);

/// Cached `sessions/tasks/` listings.
pub struct TaskListingCache {
    inner: Mutex<HashMap<PathBuf, (Instant, Vec<String>)>>,
}

impl Default for TaskListingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskListingCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// The `.md` task file names under `tasks_dir`, cached for 5 s.
    /// Returns `(names, cache_hit)`.
    pub fn list(&self, tasks_dir: &Path) -> (Vec<String>, bool) {
        {
            let cache = self.inner.lock();
            if let Some((at, names)) = cache.get(tasks_dir) {
                if at.elapsed() < TASK_LISTING_TTL {
                    return (names.clone(), true);
                }
            }
        }

        let mut names: Vec<String> = std::fs::read_dir(tasks_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .filter(|name| name.ends_with(".md"))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();

        self.inner
            .lock()
            .insert(tasks_dir.to_path_buf(), (Instant::now(), names.clone()));
        (names, false)
    }

    pub fn invalidate(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
#[path = "caches_tests.rs"]
mod tests;
