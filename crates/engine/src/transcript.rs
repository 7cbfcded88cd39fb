// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation transcript access.
//!
//! The host writes a line-delimited JSON log. We only ever need its tail,
//! so reads are bounded: start [`INITIAL_TAIL_BYTES`] from the end and
//! double until the window covers what the caller needs or the whole file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

/// Initial bounded read from the end of the transcript.
pub const INITIAL_TAIL_BYTES: u64 = 128 * 1024;

/// One transcript line (subset of fields we care about).
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub message: Option<Value>,
    /// Retained raw line for re-serialization.
    #[serde(skip)]
    pub raw: Value,
}

impl TranscriptEntry {
    pub fn is_message(&self) -> bool {
        self.entry_type == "user" || self.entry_type == "assistant"
    }

    /// Names of tool_use blocks in this entry, in order.
    pub fn tool_use_names(&self) -> Vec<&str> {
        content_blocks(self.message.as_ref())
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
            .filter_map(|block| block.get("name").and_then(Value::as_str))
            .collect()
    }

    /// The input of the last tool_use block named `name`, if any.
    pub fn tool_use_input(&self, name: &str) -> Option<&Value> {
        content_blocks(self.message.as_ref())
            .iter()
            .rev()
            .find(|block| {
                block.get("type").and_then(Value::as_str) == Some("tool_use")
                    && block.get("name").and_then(Value::as_str) == Some(name)
            })
            .and_then(|block| block.get("input"))
    }
}

fn content_blocks(message: Option<&Value>) -> Vec<&Value> {
    message
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().collect())
        .unwrap_or_default()
}

/// Read transcript entries from the tail of the file.
///
/// The window grows by doubling until it spans at least `min_entries`
/// parsed entries or the whole file. Unparseable lines (including the
/// truncated first line of a mid-file window) are skipped.
pub fn read_tail_entries(path: &Path, min_entries: usize) -> std::io::Result<Vec<TranscriptEntry>> {
    let mut file = File::open(path)?;
    let len = file.seek(SeekFrom::End(0))?;
    let mut window = INITIAL_TAIL_BYTES.min(len);

    loop {
        file.seek(SeekFrom::End(-(window as i64)))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;

        let mut entries = Vec::new();
        let mut lines = buf.lines();
        // A partial window starts mid-line; drop the fragment.
        if window < len {
            let _ = lines.next();
        }
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(raw) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            if let Ok(mut entry) = serde_json::from_value::<TranscriptEntry>(raw.clone()) {
                entry.raw = raw;
                entries.push(entry);
            }
        }

        if entries.len() >= min_entries || window >= len {
            return Ok(entries);
        }
        window = (window * 2).min(len);
    }
}

/// Cached tail windows, keyed by path and validated by `(mtime, len)`.
///
/// The value is the parsed tail window from the last read. A hit needs
/// the file unchanged on disk and a cached window at least as deep as
/// the caller asks for; anything else falls through to a fresh read.
pub struct TailCache {
    inner: Mutex<HashMap<PathBuf, CachedTail>>,
}

struct CachedTail {
    mtime: SystemTime,
    len: u64,
    /// The `min_entries` the window was read with.
    min_entries: usize,
    entries: Vec<TranscriptEntry>,
}

impl Default for TailCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TailCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Read transcript entries through the cache.
    ///
    /// Returns the entries plus whether the cache served them.
    pub fn read(
        &self,
        path: &Path,
        min_entries: usize,
    ) -> std::io::Result<(Vec<TranscriptEntry>, bool)> {
        let meta = std::fs::metadata(path)?;
        let mtime = meta.modified()?;
        let len = meta.len();

        {
            let cache = self.inner.lock();
            if let Some(cached) = cache.get(path) {
                let unchanged = cached.mtime == mtime && cached.len == len;
                let deep_enough =
                    cached.entries.len() >= min_entries || cached.min_entries >= min_entries;
                if unchanged && deep_enough {
                    return Ok((cached.entries.clone(), true));
                }
            }
        }

        let entries = read_tail_entries(path, min_entries)?;
        self.inner.lock().insert(
            path.to_path_buf(),
            CachedTail {
                mtime,
                len,
                min_entries,
                entries: entries.clone(),
            },
        );
        Ok((entries, false))
    }

    pub fn invalidate(&self) {
        self.inner.lock().clear();
    }
}

/// Chunk text to at most `max_bytes` per chunk, breaking preferentially
/// at a newline, else a space, else a hard cut on a char boundary.
pub fn chunk_text(text: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max_bytes {
        let window = floor_char_boundary(rest, max_bytes);
        let mut cut = rest[..window]
            .rfind('\n')
            .map(|i| i + 1)
            .or_else(|| rest[..window].rfind(' ').map(|i| i + 1))
            .unwrap_or(window);
        if cut == 0 {
            // max_bytes smaller than one char; take a single char anyway
            cut = rest
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
        }
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Largest index `<= at` that lands on a char boundary.
fn floor_char_boundary(s: &str, at: usize) -> usize {
    if at >= s.len() {
        return s.len();
    }
    let mut i = at;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
