// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent client for CLI commands

use std::path::{Path, PathBuf};
use std::time::Duration;

use podcap_core::{CaptureSummary, LifecycleEvent};
use podcap_daemon::protocol::{self, ProtocolError};
use podcap_daemon::{Request, Response, PROTOCOL_VERSION};
use serde::Serialize;
use thiserror::Error;
use tokio::net::UnixStream;

use crate::env;

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

/// Status reported by the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    pub node: String,
    pub uptime_secs: u64,
    pub captures: Vec<CaptureSummary>,
}

/// Agent client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the agent in the configured state directory.
    ///
    /// Fails fast with [`ClientError::DaemonNotRunning`] if there is no socket.
    pub fn connect() -> Result<Self, ClientError> {
        Self::at(env::state_dir()?.join("daemon.sock"))
    }

    pub fn at(socket_path: PathBuf) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            // Socket file left behind by a dead agent
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let timeout = timeout_ipc();
        protocol::write_request(&mut writer, request, timeout).await?;
        Ok(protocol::read_response(&mut reader, timeout).await?)
    }

    /// Deliver a lifecycle event
    pub async fn emit_event(&self, event: LifecycleEvent) -> Result<(), ClientError> {
        match self.send(&Request::Event { event }).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Get agent version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<AgentStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                node,
                uptime_secs,
                captures,
            } => Ok(AgentStatus {
                node,
                uptime_secs,
                captures,
            }),
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
