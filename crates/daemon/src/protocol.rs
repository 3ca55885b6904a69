// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for agent communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use podcap_core::{CaptureSummary, LifecycleEvent};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    read_request, read_response, write_request, write_response, ProtocolError, DEFAULT_TIMEOUT,
    MAX_MESSAGE_SIZE,
};

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request from a client (CLI or watcher) to the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Deliver a lifecycle event to the engine loop
    Event { event: LifecycleEvent },

    /// Get agent status and live captures
    Status,

    /// Stop all captures and exit
    Shutdown,
}

/// Response from the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Agent is shutting down
    ShuttingDown,

    /// Agent status
    Status {
        node: String,
        uptime_secs: u64,
        #[serde(default)]
        captures: Vec<CaptureSummary>,
    },

    /// Error response
    Error { message: String },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
