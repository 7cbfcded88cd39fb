// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook request routing.
//!
//! `ping` and `statusline` are always served here; the enforcement hooks
//! (`sessions_enforce`, `post_tool_use`, `subagent_hooks`,
//! `user_messages`, `session_start`) are the progressively-migrated set
//! the shims route in behind the `use_hook_daemon` flag. State-mutating
//! handlers are serialized; read-only ones run in parallel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ccs_core::{HookOutcome, HookPayload, ProjectPaths};
use ccs_engine::EnforceCtx;
use parking_lot::Mutex;
use serde_json::json;
use tracing::warn;

use crate::bench::Bench;
use crate::caches::TaskListingCache;
use crate::protocol::{HookRequest, HookResponse};

/// Shared daemon context for all request handlers.
///
/// The git snapshot and transcript-tail caches live inside each
/// project's [`EnforceCtx`], which this map keeps alive across requests.
pub struct DaemonCtx {
    /// Per-project engine contexts, keyed by canonical project root.
    projects: Mutex<HashMap<PathBuf, Arc<Mutex<EnforceCtx>>>>,
    /// Serializes state-mutating handlers.
    mutate: tokio::sync::Mutex<()>,
    pub task_listings: TaskListingCache,
    pub bench: Bench,
}

impl DaemonCtx {
    pub fn new(bench: Bench) -> Self {
        Self {
            projects: Mutex::new(HashMap::new()),
            mutate: tokio::sync::Mutex::new(()),
            task_listings: TaskListingCache::new(),
            bench,
        }
    }

    /// The engine context for the project owning `payload.cwd`.
    fn project(&self, payload: &HookPayload) -> Result<Arc<Mutex<EnforceCtx>>, String> {
        let cwd = payload
            .cwd
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .ok_or_else(|| "no working directory in payload".to_string())?;
        let paths = ProjectPaths::from_cwd(&cwd);
        let root = paths.root().to_path_buf();

        if let Some(handle) = self.projects.lock().get(&root) {
            return Ok(Arc::clone(handle));
        }
        let ctx = EnforceCtx::new(paths).map_err(|e| e.to_string())?;
        let handle = Arc::new(Mutex::new(ctx));
        self.projects.lock().insert(root, Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop cached contexts and caches (config may have changed on disk).
    pub fn invalidate(&self) {
        self.projects.lock().clear();
        self.task_listings.invalidate();
    }
}

/// Handle one request, wrapping handler failures into the exit-3
/// envelope so a broken handler never hangs the shim.
pub async fn handle(ctx: &Arc<DaemonCtx>, request: HookRequest) -> HookResponse {
    let started = Instant::now();
    let hook = request.hook.clone();
    let request_id = request.request_id.clone();

    let result = route(ctx, &request).await;

    let response = match result {
        Ok(outcome) => HookResponse {
            request_id,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            exit_code: outcome.exit_code,
        },
        Err(message) => {
            warn!(hook = %hook, error = %message, "handler failed");
            HookResponse::handler_error(request.request_id, &message)
        }
    };

    ctx.bench.record(
        &hook,
        started.elapsed(),
        json!({"exit_code": response.exit_code}),
    );
    response
}

async fn route(ctx: &Arc<DaemonCtx>, request: &HookRequest) -> Result<HookOutcome, String> {
    // `ping` and other bare requests carry a null payload.
    let payload: HookPayload = if request.payload.is_null() {
        HookPayload::default()
    } else {
        serde_json::from_value(request.payload.clone()).map_err(|e| e.to_string())?
    };

    match request.hook.as_str() {
        "ping" => Ok(HookOutcome {
            stdout: "pong".into(),
            stderr: String::new(),
            exit_code: 0,
        }),

        "statusline" => {
            let project = ctx.project(&payload)?;
            let caches = Arc::clone(ctx);
            tokio::task::spawn_blocking(move || {
                let mut engine = project.lock();
                engine.refresh_config_if_stale();
                let mut outcome = ccs_engine::render_statusline(&engine, &payload)
                    .map_err(|e| e.to_string())?;
                // Daemon-only enrichment: open task count from the 5s cache.
                let (tasks, _hit) = caches.task_listings.list(&engine.paths.tasks_dir());
                if !tasks.is_empty() {
                    outcome.stdout.push_str(&format!(" | tasks {}", tasks.len()));
                }
                Ok(outcome)
            })
            .await
            .map_err(|e| format!("handler panicked: {e}"))?
        }

        "sessions_enforce" => {
            let project = ctx.project(&payload)?;
            run_blocking(ctx, project, payload, true, |engine, payload| {
                ccs_engine::pre_tool_use(engine, payload)
            })
            .await
        }

        "post_tool_use" => {
            let project = ctx.project(&payload)?;
            run_blocking(ctx, project, payload, true, |engine, payload| {
                ccs_engine::post_tool_use(engine, payload)
            })
            .await
        }

        "subagent_hooks" => {
            let project = ctx.project(&payload)?;
            run_blocking(ctx, project, payload, true, |engine, payload| {
                ccs_engine::subagent_stop(engine, payload)
            })
            .await
        }

        "user_messages" => {
            let project = ctx.project(&payload)?;
            run_blocking(ctx, project, payload, true, |engine, payload| {
                ccs_engine::user_prompt_submit(engine, payload)
            })
            .await
        }

        "session_start" => {
            let project = ctx.project(&payload)?;
            run_blocking(ctx, project, payload, true, |engine, payload| {
                ccs_engine::session_start(engine, payload)
            })
            .await
        }

        other => Err(format!("unknown hook: {other}")),
    }
}

/// Run an engine handler on the blocking pool, serializing mutators.
async fn run_blocking<F>(
    ctx: &Arc<DaemonCtx>,
    project: Arc<Mutex<EnforceCtx>>,
    payload: HookPayload,
    mutating: bool,
    f: F,
) -> Result<HookOutcome, String>
where
    F: FnOnce(&EnforceCtx, &HookPayload) -> Result<HookOutcome, ccs_engine::EngineError>
        + Send
        + 'static,
{
    let guard = if mutating {
        Some(ctx.mutate.lock().await)
    } else {
        None
    };

    let result = tokio::task::spawn_blocking(move || {
        let mut engine = project.lock();
        engine.refresh_config_if_stale();
        f(&engine, &payload).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("handler panicked: {e}"))?;

    drop(guard);
    result
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
