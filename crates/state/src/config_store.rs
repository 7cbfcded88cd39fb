// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The config store.
//!
//! Reads never take the lock — atomic replacement gives point-in-time
//! consistency. Two in-place schema migrations run on load and re-persist
//! the file when either fires:
//!
//! - boolean `use_nerd_fonts` becomes tri-valued `features.icon_style`
//! - `trigger_phrases.implementation_mode` is renamed to
//!   `trigger_phrases.orchestration_mode` (never duplicated)

use std::path::{Path, PathBuf};

use ccs_core::{ProjectPaths, SessionsConfig};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::atomic::write_atomic;

/// Errors from config store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store handle for one project's config record.
pub struct ConfigStore {
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            config_file: paths.config_file(),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Load the config, running migrations and re-persisting if any fired.
    ///
    /// Missing file yields defaults without persisting (the config is
    /// user-managed and checked into the repo). A corrupt file is renamed
    /// aside once and replaced with defaults.
    pub fn load(&self) -> Result<SessionsConfig, ConfigError> {
        let raw = match std::fs::read_to_string(&self.config_file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionsConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                let bad = self.config_file.with_extension("json.bad");
                warn!(
                    path = %self.config_file.display(),
                    error = %e,
                    "corrupt config file, renaming aside and using defaults"
                );
                let _ = std::fs::rename(&self.config_file, &bad);
                return Ok(SessionsConfig::default());
            }
        };

        let migrated = migrate(&mut value);
        let config: SessionsConfig = serde_json::from_value(value)?;
        if migrated {
            self.save(&config)?;
        }
        Ok(config)
    }

    /// Persist the config atomically.
    pub fn save(&self, config: &SessionsConfig) -> Result<(), ConfigError> {
        let body = serde_json::to_vec_pretty(config)?;
        write_atomic(&self.config_file, &body)?;
        Ok(())
    }
}

/// Apply schema migrations to a raw config value. Returns true when any
/// migration changed the document.
fn migrate(value: &mut Value) -> bool {
    let Some(obj) = value.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    // use_nerd_fonts (bool) -> features.icon_style
    if let Some(nerd) = obj.remove("use_nerd_fonts") {
        let style = if nerd.as_bool().unwrap_or(false) {
            "nerd-fonts"
        } else {
            "emoji"
        };
        let features = obj
            .entry("features")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Some(features) = features.as_object_mut() {
            features
                .entry("icon_style")
                .or_insert_with(|| Value::String(style.to_string()));
        }
        changed = true;
    }

    // trigger_phrases.implementation_mode -> trigger_phrases.orchestration_mode
    if let Some(phrases) = obj.get_mut("trigger_phrases").and_then(Value::as_object_mut) {
        if let Some(legacy) = phrases.remove("implementation_mode") {
            phrases.entry("orchestration_mode").or_insert(legacy);
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
#[path = "config_store_tests.rs"]
mod tests;
