// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessError, ProcessExit, ProcessSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const SIGKILL: i32 = 9;
const SIGTERM: i32 = 15;

/// Recorded process call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Spawn { spec: ProcessSpec },
    Terminate { pid: u32 },
    Kill { pid: u32 },
    Wait { pid: u32 },
}

/// Fake process state
#[derive(Debug, Clone)]
pub struct FakeProcessRecord {
    pub spec: ProcessSpec,
    pub alive: bool,
    pub reaped: bool,
    pub exit: Option<ProcessExit>,
}

/// Handle returned by [`FakeProcessAdapter::spawn`]
#[derive(Debug)]
pub struct FakeProcess {
    pid: u32,
}

impl FakeProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

#[derive(Default)]
struct FakeProcessState {
    processes: BTreeMap<u32, FakeProcessRecord>,
    calls: Vec<ProcessCall>,
    next_pid: u32,
    spawn_error: Option<String>,
    terminate_error: Option<String>,
    wait_error: Option<String>,
    ignore_terminate: bool,
    spawn_delay: Option<Duration>,
}

/// Fake process adapter for testing.
///
/// Processes stay alive until terminated, killed, or marked exited, so
/// `wait` blocks exactly like a real supervisor would.
#[derive(Clone, Default)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Specs of every spawn attempt, successful or not
    pub fn spawned(&self) -> Vec<ProcessSpec> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Spawn { spec } => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    /// Get a process by pid
    pub fn process(&self, pid: u32) -> Option<FakeProcessRecord> {
        self.inner.lock().processes.get(&pid).cloned()
    }

    /// All processes that were successfully spawned, by pid
    pub fn processes(&self) -> BTreeMap<u32, FakeProcessRecord> {
        self.inner.lock().processes.clone()
    }

    /// Number of spawned processes that have not been reaped
    pub fn unreaped_count(&self) -> usize {
        self.inner
            .lock()
            .processes
            .values()
            .filter(|p| !p.reaped)
            .count()
    }

    /// Make subsequent spawns fail
    pub fn set_spawn_error(&self, message: Option<&str>) {
        self.inner.lock().spawn_error = message.map(str::to_string);
    }

    /// Make subsequent terminate calls fail without signalling
    pub fn set_terminate_error(&self, message: Option<&str>) {
        self.inner.lock().terminate_error = message.map(str::to_string);
    }

    /// Make subsequent wait calls fail immediately
    pub fn set_wait_error(&self, message: Option<&str>) {
        self.inner.lock().wait_error = message.map(str::to_string);
    }

    /// Processes ignore SIGTERM (only kill or exit ends them)
    pub fn set_ignore_terminate(&self, ignore: bool) {
        self.inner.lock().ignore_terminate = ignore;
    }

    /// Delay spawns to widen race windows in concurrency tests
    pub fn set_spawn_delay(&self, delay: Option<Duration>) {
        self.inner.lock().spawn_delay = delay;
    }

    /// Mark a process as exited on its own
    pub fn set_exited(&self, pid: u32, code: i32) {
        if let Some(process) = self.inner.lock().processes.get_mut(&pid) {
            process.alive = false;
            process.exit = Some(ProcessExit {
                code: Some(code),
                signal: None,
            });
        }
    }

    fn end(&self, pid: u32, signal: i32) {
        if let Some(process) = self.inner.lock().processes.get_mut(&pid) {
            if process.alive {
                process.alive = false;
                process.exit = Some(ProcessExit {
                    code: None,
                    signal: Some(signal),
                });
            }
        }
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    type Process = FakeProcess;

    async fn spawn(&self, spec: &ProcessSpec) -> Result<FakeProcess, ProcessError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Spawn { spec: spec.clone() });
            if let Some(ref message) = inner.spawn_error {
                return Err(ProcessError::SpawnFailed(message.clone()));
            }
            inner.spawn_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        inner.next_pid += 1;
        let pid = 1000 + inner.next_pid;
        inner.processes.insert(
            pid,
            FakeProcessRecord {
                spec: spec.clone(),
                alive: true,
                reaped: false,
                exit: None,
            },
        );
        Ok(FakeProcess { pid })
    }

    fn pid(&self, process: &FakeProcess) -> Option<u32> {
        Some(process.pid)
    }

    async fn terminate(&self, process: &mut FakeProcess) -> Result<(), ProcessError> {
        let ignore = {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Terminate { pid: process.pid });
            if let Some(ref message) = inner.terminate_error {
                return Err(ProcessError::SignalFailed(message.clone()));
            }
            inner.ignore_terminate
        };
        if !ignore {
            self.end(process.pid, SIGTERM);
        }
        Ok(())
    }

    async fn kill(&self, process: &mut FakeProcess) -> Result<(), ProcessError> {
        self.inner
            .lock()
            .calls
            .push(ProcessCall::Kill { pid: process.pid });
        self.end(process.pid, SIGKILL);
        Ok(())
    }

    async fn wait(&self, process: &mut FakeProcess) -> Result<ProcessExit, ProcessError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Wait { pid: process.pid });
            if let Some(ref message) = inner.wait_error {
                return Err(ProcessError::WaitFailed(message.clone()));
            }
        }

        loop {
            {
                let mut inner = self.inner.lock();
                let Some(record) = inner.processes.get_mut(&process.pid) else {
                    return Err(ProcessError::WaitFailed(format!(
                        "no such process: {}",
                        process.pid
                    )));
                };
                if !record.alive {
                    record.reaped = true;
                    return Ok(record.exit.unwrap_or(ProcessExit {
                        code: None,
                        signal: None,
                    }));
                }
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
