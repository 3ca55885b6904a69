// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process supervision adapters
//!
//! The engine only needs three things from a capture process: it can be
//! spawned, signalled, and waited on. Everything else about the tool is
//! opaque.

mod system;

pub use system::SystemProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessAdapter, FakeProcessRecord, ProcessCall};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("signal failed: {0}")]
    SignalFailed(String),
    #[error("wait failed: {0}")]
    WaitFailed(String),
}

/// Command line and environment for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined for log output
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
    /// Terminating signal number, when killed by one
    pub signal: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => f.write_str("unknown"),
        }
    }
}

/// Adapter for spawning and supervising long-running processes
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Handle to one spawned process
    type Process: Send + 'static;

    /// Spawn a process in the background
    async fn spawn(&self, spec: &ProcessSpec) -> Result<Self::Process, ProcessError>;

    /// OS process id, if the process has not been reaped yet
    fn pid(&self, process: &Self::Process) -> Option<u32>;

    /// Ask the process to exit gracefully (SIGTERM)
    ///
    /// A process that already exited is not an error.
    async fn terminate(&self, process: &mut Self::Process) -> Result<(), ProcessError>;

    /// Force the process to exit (SIGKILL)
    async fn kill(&self, process: &mut Self::Process) -> Result<(), ProcessError>;

    /// Block until the process exits and reap it
    async fn wait(&self, process: &mut Self::Process) -> Result<ProcessExit, ProcessError>;
}

#[cfg(test)]
#[path = "../process_tests.rs"]
mod tests;
