// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for engine tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use ccs_core::{HookPayload, ProjectPaths, SessionsConfig, SessionsState};
use ccs_state::ConfigStore;

use crate::ctx::EnforceCtx;

/// A throwaway project rooted in a tempdir with a live context.
pub struct TestProject {
    pub dir: tempfile::TempDir,
    pub ctx: EnforceCtx,
}

pub fn project() -> TestProject {
    let dir = tempfile::tempdir().unwrap();
    let ctx = EnforceCtx::new(ProjectPaths::new(dir.path())).unwrap();
    TestProject { dir, ctx }
}

impl TestProject {
    pub fn root(&self) -> &std::path::Path {
        self.ctx.paths.root()
    }

    pub fn state(&self) -> SessionsState {
        self.ctx.state.load().unwrap()
    }

    pub fn set_state(&self, f: impl FnOnce(&mut SessionsState)) {
        self.ctx.state.edit(f).unwrap();
    }

    pub fn set_config(&mut self, f: impl FnOnce(&mut SessionsConfig)) {
        let mut config = self.ctx.config.clone();
        f(&mut config);
        ConfigStore::new(&self.ctx.paths).save(&config).unwrap();
        self.ctx.reload_config().unwrap();
    }
}

/// Build a payload from inline JSON.
pub fn payload(value: serde_json::Value) -> HookPayload {
    serde_json::from_value(value).unwrap()
}

/// Run `f` with CI detection env vars cleared.
pub fn without_ci<T>(f: impl FnOnce() -> T) -> T {
    for var in ["CI", "GITHUB_ACTIONS", "CONTINUOUS_INTEGRATION"] {
        std::env::remove_var(var);
    }
    f()
}
