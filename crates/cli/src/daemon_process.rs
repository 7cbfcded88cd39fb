// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management: locating, spawning, and stopping ccsd.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Find the ccsd binary: `CCS_DAEMON_BINARY` override, then a sibling of
/// the current executable, then `$PATH`.
pub fn find_ccsd_binary() -> PathBuf {
    if let Some(path) = std::env::var_os("CCS_DAEMON_BINARY") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("ccsd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("ccsd")
}

/// Spawn the daemon detached from this shim's stdio.
pub fn start_daemon_background() -> std::io::Result<std::process::Child> {
    Command::new(find_ccsd_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

fn state_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cc-sessions"))
}

/// The version a running daemon advertised at startup.
pub fn read_daemon_version() -> Option<String> {
    let version_path = state_dir()?.join("daemon.version");
    std::fs::read_to_string(version_path).ok()
}

/// Restart the daemon once per process when its advertised version does
/// not match this binary.
pub fn restart_on_version_skew() {
    use std::sync::atomic::{AtomicBool, Ordering};
    static RESTARTED: AtomicBool = AtomicBool::new(false);

    if RESTARTED.load(Ordering::SeqCst) {
        return;
    }
    let Some(daemon_version) = read_daemon_version() else {
        return;
    };
    let ours = env!("CARGO_PKG_VERSION");
    if daemon_version.trim() != ours {
        RESTARTED.store(true, Ordering::SeqCst);
        eprintln!(
            "warn: daemon version {} does not match ccs {ours}, restarting daemon",
            daemon_version.trim(),
        );
        stop_daemon(Duration::from_secs(2));
    }
}

/// The PID from the daemon pid file, if present and parseable.
pub fn read_daemon_pid() -> Option<u32> {
    let pid_path = state_dir()?.join("daemon.pid");
    std::fs::read_to_string(pid_path)
        .ok()?
        .trim()
        .parse::<u32>()
        .ok()
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// True when a process with `pid` exists.
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Stop the daemon: SIGTERM, wait, then SIGKILL if it lingers.
pub fn stop_daemon(timeout: Duration) -> bool {
    let Some(pid) = read_daemon_pid() else {
        return false;
    };
    kill_signal("-15", pid);

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    kill_signal("-9", pid);
    !process_exists(pid)
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
