// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for daemon communication.
//!
//! One JSON object per `\n`-framed line, in both directions. Requests
//! carry `{requestId, hook, payload}`; responses carry
//! `{requestId, stdout, stderr, exitCode}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Maximum line size (16 MB — transcripts never travel over the wire).
pub const MAX_LINE_SIZE: usize = 16 * 1024 * 1024;

/// Default IPC timeout.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// A hook request from a shim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookRequest {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub hook: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// The daemon's answer, mirrored onto the shim's stdout/stderr/exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(rename = "exitCode", default)]
    pub exit_code: i32,
}

impl HookResponse {
    /// The §7 handler-failure envelope.
    pub fn handler_error(request_id: impl Into<String>, message: &str) -> Self {
        Self {
            request_id: request_id.into(),
            stdout: String::new(),
            stderr: format!("Handler error: {message}"),
            exit_code: 3,
        }
    }
}

/// Read one request line from an async reader, with timeout.
pub async fn read_request<R>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<HookRequest, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
{
    let line = read_line(reader, timeout).await?;
    Ok(serde_json::from_str(&line)?)
}

/// Read one response line from an async reader, with timeout.
pub async fn read_response<R>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<HookResponse, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
{
    let line = read_line(reader, timeout).await?;
    Ok(serde_json::from_str(&line)?)
}

async fn read_line<R>(reader: &mut R, timeout: std::time::Duration) -> Result<String, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    if n == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    if line.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: line.len(),
            max: MAX_LINE_SIZE,
        });
    }
    Ok(line)
}

/// Write one JSON line to an async writer, with timeout.
pub async fn write_line<W, T>(
    writer: &mut W,
    message: &T,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let mut body = serde_json::to_vec(message)?;
    if body.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: body.len(),
            max: MAX_LINE_SIZE,
        });
    }
    body.push(b'\n');
    tokio::time::timeout(timeout, async {
        writer.write_all(&body).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
