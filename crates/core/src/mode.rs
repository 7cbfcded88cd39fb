// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission regimes and protocol phases.

use serde::{Deserialize, Serialize};

/// The current permission regime.
///
/// `Discussion` blocks implementation tools; `Orchestration` permits them.
/// The legacy on-disk value `"implementation"` maps to `Orchestration` on
/// load and is never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Discussion,
    Orchestration,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Discussion => "discussion",
            Mode::Orchestration => "orchestration",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "discussion" => Ok(Mode::Discussion),
            // "implementation" is the pre-0.2 name for the same regime
            "orchestration" | "implementation" => Ok(Mode::Orchestration),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["discussion", "orchestration"],
            )),
        }
    }
}

/// The protocol currently driving the session, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Creation,
    Startup,
    Completion,
    Compaction,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Protocol::Creation => "creation",
            Protocol::Startup => "startup",
            Protocol::Completion => "completion",
            Protocol::Compaction => "compaction",
        };
        f.write_str(s)
    }
}

/// Host model family, as reported by the statusline payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Sonnet,
    Opus,
    #[default]
    Unknown,
}

impl ModelTier {
    /// Classify a host-reported model display name.
    pub fn from_display_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("opus") {
            ModelTier::Opus
        } else if lower.contains("sonnet") {
            ModelTier::Sonnet
        } else {
            ModelTier::Unknown
        }
    }
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
