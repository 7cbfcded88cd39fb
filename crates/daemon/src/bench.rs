// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opt-in handler instrumentation.
//!
//! When `CC_SESSIONS_BENCHMARK=1`, every handler appends a JSONL record
//! with its high-resolution duration and cache tags.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Benchmark sink.
pub struct Bench {
    path: Option<PathBuf>,
}

impl Bench {
    /// Enabled iff `CC_SESSIONS_BENCHMARK=1`.
    pub fn from_env(base_dir: &std::path::Path) -> Self {
        let enabled = std::env::var("CC_SESSIONS_BENCHMARK")
            .map(|v| v == "1")
            .unwrap_or(false);
        Self {
            path: enabled.then(|| base_dir.join("benchmark.jsonl")),
        }
    }

    #[cfg(test)]
    pub(crate) fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append one record. Best-effort.
    pub fn record(&self, handler: &str, duration: Duration, tags: serde_json::Value) {
        let Some(path) = &self.path else {
            return;
        };
        let mut record = serde_json::json!({
            "ts": epoch_micros(),
            "handler": handler,
            "duration_us": duration.as_micros() as u64,
        });
        if let (Some(obj), Some(extra)) = (record.as_object_mut(), tags.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{record}");
        }
    }
}

fn epoch_micros() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

#[cfg(test)]
#[path = "bench_tests.rs"]
mod tests;
