// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling them without blocking the engine loop. Lifecycle events are
//! queued onto the EventBus for the engine loop to reconcile.

use std::sync::Arc;
use std::time::Instant;

use podcap_adapters::ProcessAdapter;
use podcap_engine::CaptureRegistry;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::event_bus::EventBus;
use podcap_daemon::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Shared context for connection handlers
pub struct ListenCtx<A: ProcessAdapter> {
    pub event_bus: EventBus,
    pub registry: Arc<CaptureRegistry<A>>,
    pub node: String,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<A: ProcessAdapter> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<A>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<A: ProcessAdapter> Listener<A> {
    pub fn new(socket: UnixListener, ctx: ListenCtx<A>) -> Self {
        Self {
            socket,
            ctx: Arc::new(ctx),
        }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<A: ProcessAdapter>(
    stream: UnixStream,
    ctx: &ListenCtx<A>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Status is polled; everything else is worth an info line
    if matches!(request, Request::Status | Request::Ping) {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    let shutdown = matches!(request, Request::Shutdown);
    let response = handle_request(request, ctx).await;

    debug!("Sending response: {:?}", response);
    let written = protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await;

    // Wake the engine loop only once the client has its reply
    if shutdown {
        ctx.shutdown.notify_one();
    }

    written?;
    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<A: ProcessAdapter>(
    request: Request,
    ctx: &ListenCtx<A>,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Event { event } => match ctx.event_bus.send(event).await {
            Ok(()) => Response::Ok,
            Err(_) => Response::Error {
                message: "agent is shutting down".to_string(),
            },
        },

        Request::Status => Response::Status {
            node: ctx.node.clone(),
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            captures: ctx.registry.summaries().await,
        },

        Request::Shutdown => Response::ShuttingDown,
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
