// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers.
//!
//! Every child process the engine runs gets a wall-clock bound. The
//! child is spawned with piped output, the pipes are drained on reader
//! threads so a chatty child cannot deadlock against a full pipe
//! buffer, and the child is killed once the deadline passes. A hung git
//! or bridge process must never wedge a hook.

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Default timeout for git status snapshots.
pub const GIT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for backlog bridge calls.
pub const BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for a child to exit.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::spawn()` with a bounded wait, converting deadline
/// expiration into a descriptive error message. The child process is
/// killed when the timeout elapses.
pub fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .map_err(|e| format!("{description} failed: {e}"))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(Output {
                    status,
                    stdout: stdout.join().unwrap_or_default(),
                    stderr: stderr.join().unwrap_or_default(),
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!(
                        "{description} timed out after {}s",
                        timeout.as_secs()
                    ));
                }
                std::thread::sleep(WAIT_POLL);
            }
            Err(e) => {
                let _ = child.kill();
                return Err(format!("{description} failed: {e}"));
            }
        }
    }
}

/// Drain a child pipe on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
