// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process adapter backed by tokio

use super::{ProcessAdapter, ProcessError, ProcessExit, ProcessSpec};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Spawns real child processes.
///
/// The child inherits stdout/stderr so the capture tool's own diagnostics
/// end up next to the agent's output.
#[derive(Clone, Default)]
pub struct SystemProcessAdapter;

impl SystemProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for SystemProcessAdapter {
    type Process = Child;

    async fn spawn(&self, spec: &ProcessSpec) -> Result<Child, ProcessError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            // Never leave an unsupervised capture behind if the handle is dropped
            .kill_on_drop(true);

        cmd.spawn()
            .map_err(|e| ProcessError::SpawnFailed(format!("{}: {}", spec.program, e)))
    }

    fn pid(&self, process: &Child) -> Option<u32> {
        process.id()
    }

    async fn terminate(&self, process: &mut Child) -> Result<(), ProcessError> {
        // id() is None once the child has been reaped
        let Some(pid) = process.id() else {
            return Ok(());
        };
        send_signal(pid, Signal::SIGTERM)
    }

    async fn kill(&self, process: &mut Child) -> Result<(), ProcessError> {
        if process.id().is_none() {
            return Ok(());
        }
        process
            .start_kill()
            .map_err(|e| ProcessError::SignalFailed(format!("SIGKILL: {}", e)))
    }

    async fn wait(&self, process: &mut Child) -> Result<ProcessExit, ProcessError> {
        let status = process
            .wait()
            .await
            .map_err(|e| ProcessError::WaitFailed(e.to_string()))?;
        Ok(ProcessExit {
            code: status.code(),
            signal: status.signal(),
        })
    }
}

fn send_signal(pid: u32, sig: Signal) -> Result<(), ProcessError> {
    let raw = i32::try_from(pid)
        .map_err(|_| ProcessError::SignalFailed(format!("pid {} out of range", pid)))?;
    match signal::kill(Pid::from_raw(raw), sig) {
        // Exited between the id() check and the signal
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::SignalFailed(format!(
            "{} to pid {}: {}",
            sig, pid, e
        ))),
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
