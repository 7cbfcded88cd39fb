// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ccs - cc-sessions hook shims and minimal state surface.
//!
//! One subcommand per host hook event. Each shim reads the payload from
//! stdin, dials the daemon (auto-spawning it when needed), and falls
//! back to the bundled in-process implementation when the daemon is
//! unreachable — so a sandboxed environment that refuses `listen()`
//! still enforces correctly.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod legacy;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ccs", version, about = "cc-sessions workflow enforcement")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hook shims invoked by the host agent (payload on stdin)
    Hook {
        /// Event name: pre-tool-use, post-tool-use, subagent-stop,
        /// session-start, user-prompt-submit, statusline
        event: String,
    },
    /// Daemon management
    Daemon {
        #[command(subcommand)]
        action: commands::daemon::DaemonAction,
    },
    /// Todo list surface
    Todos {
        #[command(subcommand)]
        action: commands::todos::TodosAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Hook { event } => commands::hook::run(&event),
        Commands::Daemon { action } => commands::daemon::run(action),
        Commands::Todos { action } => commands::todos::run(action),
    };
    std::process::exit(code);
}
