// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous daemon client for the hook shims.
//!
//! Shims are single-request processes, so the client is plain blocking
//! IO over a Unix stream: write one request line, read one response
//! line. A missing or refusing socket triggers an auto-spawn of `ccsd`
//! followed by a bounded wait for the socket to appear.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ccs_daemon::{socket_path, HookRequest, HookResponse};
use thiserror::Error;

use crate::daemon_process;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Budget for the socket to appear after auto-spawn.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("CCS_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_millis(1500))
}

/// Timeout for one request/response exchange.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("CCS_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval while waiting for the socket.
pub fn poll_interval() -> Duration {
    parse_duration_ms("CCS_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("timed out waiting for the daemon socket")]
    DaemonStartTimeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad response: {0}")]
    BadResponse(#[from] serde_json::Error),
}

/// A connected daemon client.
pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect without side effects (status queries).
    pub fn connect() -> Result<Self, ClientError> {
        let socket = socket_path();
        match UnixStream::connect(&socket) {
            Ok(stream) => Ok(Self { stream }),
            Err(e) if is_retryable(&e) => Err(ClientError::DaemonNotRunning),
            Err(e) => Err(e.into()),
        }
    }

    /// Connect, auto-spawning the daemon when the socket is missing or
    /// the connect fails with a retryable error.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        daemon_process::restart_on_version_skew();
        let socket = socket_path();
        match UnixStream::connect(&socket) {
            Ok(stream) => return Ok(Self { stream }),
            Err(e) if is_retryable(&e) => {}
            Err(e) => return Err(e.into()),
        }

        daemon_process::start_daemon_background()
            .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))?;
        Self::wait_for_socket(&socket, timeout_connect())
    }

    fn wait_for_socket(socket: &PathBuf, budget: Duration) -> Result<Self, ClientError> {
        let deadline = Instant::now() + budget;
        loop {
            match UnixStream::connect(socket) {
                Ok(stream) => return Ok(Self { stream }),
                Err(e) if is_retryable(&e) => {
                    if Instant::now() >= deadline {
                        return Err(ClientError::DaemonStartTimeout);
                    }
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One request/response exchange.
    pub fn request(
        mut self,
        hook: &str,
        payload: serde_json::Value,
    ) -> Result<HookResponse, ClientError> {
        let request = HookRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            hook: hook.to_string(),
            payload,
        };

        self.stream.set_write_timeout(Some(timeout_ipc()))?;
        self.stream.set_read_timeout(Some(timeout_ipc()))?;

        let mut body = serde_json::to_vec(&request)?;
        body.push(b'\n');
        self.stream.write_all(&body)?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.is_empty() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(serde_json::from_str(&line)?)
    }
}

/// Connect-failure kinds worth an auto-spawn and retry.
fn is_retryable(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::NotFound
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::AddrNotAvailable
    )
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
