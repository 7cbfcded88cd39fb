// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotating JSONL operational log.
//!
//! Every error and noteworthy event in the hook path lands here rather
//! than on the host's stderr. Rotation shifts `orchestrator.log` →
//! `.1` → `.2` → `.3`, deleting the oldest, once the file exceeds the
//! size cap.
//!
//! Environment: `ORCH_LOG_PATH`, `ORCH_LOG_LEVEL` (error|warn|info|debug),
//! `ORCH_LOG_MAX_BYTES`, `ORCH_LOG_MAX_BACKUPS`.

use std::io::Write;
use std::path::PathBuf;

use ccs_core::ProjectPaths;
use serde_json::json;

const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_BACKUPS: u32 = 3;

/// Log severities, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

/// Handle to the rotating JSONL log.
pub struct OpLog {
    path: PathBuf,
    min_level: Level,
    max_bytes: u64,
    max_backups: u32,
}

impl OpLog {
    /// Build from environment, defaulting into the shared state dir.
    pub fn from_env(paths: &ProjectPaths) -> Self {
        let path = std::env::var_os("ORCH_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| paths.shared_state_dir().join("orchestrator.log"));
        let min_level = std::env::var("ORCH_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::parse(&s))
            .unwrap_or(Level::Info);
        let max_bytes = std::env::var("ORCH_LOG_MAX_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_BYTES);
        let max_backups = std::env::var("ORCH_LOG_MAX_BACKUPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_BACKUPS);
        Self {
            path,
            min_level,
            max_bytes,
            max_backups,
        }
    }

    pub fn error(&self, component: &str, message: &str, fields: serde_json::Value) {
        self.log(Level::Error, component, message, fields);
    }

    pub fn warn(&self, component: &str, message: &str, fields: serde_json::Value) {
        self.log(Level::Warn, component, message, fields);
    }

    pub fn info(&self, component: &str, message: &str, fields: serde_json::Value) {
        self.log(Level::Info, component, message, fields);
    }

    /// Append one JSONL record. Best-effort: logging never fails the hook.
    pub fn log(&self, level: Level, component: &str, message: &str, fields: serde_json::Value) {
        if level < self.min_level {
            return;
        }
        self.rotate_if_needed();

        let mut record = json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "component": component,
            "message": message,
        });
        if let (Some(obj), Some(extra)) = (record.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        else {
            return;
        };
        let _ = writeln!(file, "{record}");
    }

    fn rotate_if_needed(&self) {
        let Ok(meta) = std::fs::metadata(&self.path) else {
            return;
        };
        if meta.len() < self.max_bytes || self.max_backups == 0 {
            return;
        }

        let name = self.path.display().to_string();
        let _ = std::fs::remove_file(format!("{name}.{}", self.max_backups));
        for i in (1..self.max_backups).rev() {
            let _ = std::fs::rename(format!("{name}.{i}"), format!("{name}.{}", i + 1));
        }
        let _ = std::fs::rename(&self.path, format!("{name}.1"));
    }
}

#[cfg(test)]
#[path = "oplog_tests.rs"]
mod tests;
