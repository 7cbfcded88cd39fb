// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ccs-engine: the enforcement handlers behind every hook.
//!
//! The tool gate (PreToolUse), the post-tool bookkeeper (PostToolUse),
//! the sub-agent dispatcher (Task dispatch and SubagentStop), trigger
//! phrase handling (UserPromptSubmit), session startup, and the
//! statusline renderer. The daemon and the legacy shim path both call
//! straight into this crate.

#[cfg(test)]
mod test_helpers;

mod bookkeeper;
mod bridge;
mod ctx;
mod dispatch;
mod gate;
mod git;
mod messages;
mod oplog;
mod resolve;
mod session;
mod statusline;
mod subprocess;
mod transcript;

pub use bookkeeper::post_tool_use;
pub use bridge::{backlog_subagent_stop, spawn_reasoning_extractor, BridgeError, BridgeResult};
pub use ctx::{EnforceCtx, EngineError};
pub use dispatch::{pre_dispatch, subagent_stop, TRANSCRIPT_CHUNK_BYTES};
pub use gate::pre_tool_use;
pub use git::BranchCache;
pub use messages::user_prompt_submit;
pub use oplog::OpLog;
pub use resolve::{is_protected_path, resolve_nonstrict};
pub use session::session_start;
pub use statusline::render_statusline;
pub use subprocess::run_with_timeout;
pub use transcript::{chunk_text, read_tail_entries, TailCache, TranscriptEntry};
