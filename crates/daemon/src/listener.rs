// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket accept loop.
//!
//! Each connection gets its own task and may carry any number of
//! newline-framed requests; the connection closes on EOF or a protocol
//! error. Handler concurrency policy lives in [`crate::handlers`].

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error};

use crate::handlers::{self, DaemonCtx};
use crate::protocol::{self, ProtocolError, DEFAULT_TIMEOUT};

/// Accept connections until the task is aborted.
pub async fn run(listener: UnixListener, ctx: Arc<DaemonCtx>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, ctx).await {
                        match e {
                            ProtocolError::ConnectionClosed => debug!("client disconnected"),
                            ProtocolError::Timeout => debug!("connection timed out"),
                            other => error!("connection error: {other}"),
                        }
                    }
                });
            }
            Err(e) => {
                error!("accept error: {e}");
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: Arc<DaemonCtx>) -> Result<(), ProtocolError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = tokio::io::BufReader::new(read_half);

    loop {
        let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
        debug!(hook = %request.hook, id = %request.request_id, "request");
        let response = handlers::handle(&ctx, request).await;
        protocol::write_line(&mut write_half, &response, DEFAULT_TIMEOUT).await?;
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
