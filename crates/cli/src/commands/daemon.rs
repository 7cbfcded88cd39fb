// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ccs daemon` management surface.

use std::time::Duration;

use clap::Subcommand;

use crate::client::DaemonClient;
use crate::daemon_process;

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the daemon if it is not already running
    Start,
    /// Stop a running daemon
    Stop,
    /// Check whether the daemon answers
    Status,
}

pub fn run(action: DaemonAction) -> i32 {
    match action {
        DaemonAction::Start => start(),
        DaemonAction::Stop => stop(),
        DaemonAction::Status => status(),
    }
}

fn start() -> i32 {
    match DaemonClient::connect_or_start() {
        Ok(client) => match client.request("ping", serde_json::Value::Null) {
            Ok(_) => {
                println!("daemon running at {}", ccs_daemon::socket_path().display());
                0
            }
            Err(e) => {
                eprintln!("daemon started but did not answer: {e}");
                1
            }
        },
        Err(e) => {
            eprintln!("failed to start daemon: {e}");
            1
        }
    }
}

fn stop() -> i32 {
    if daemon_process::stop_daemon(Duration::from_secs(2)) {
        println!("daemon stopped");
        0
    } else {
        eprintln!("no running daemon found");
        1
    }
}

fn status() -> i32 {
    match DaemonClient::connect() {
        Ok(client) => match client.request("ping", serde_json::Value::Null) {
            Ok(response) if response.stdout == "pong" => {
                println!("daemon running at {}", ccs_daemon::socket_path().display());
                0
            }
            _ => {
                eprintln!("daemon socket present but unresponsive");
                1
            }
        },
        Err(_) => {
            println!("daemon not running");
            1
        }
    }
}
