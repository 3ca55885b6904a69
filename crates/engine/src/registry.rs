// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of running captures, one per instance.
//!
//! The registry lock is held across spawn and across the whole
//! stop sequence (signal, wait, artifact cleanup). A start for an
//! instance therefore never overlaps a stop of the same instance, and
//! two concurrent starts never both spawn.

use crate::capture::CaptureConfig;
use podcap_adapters::{ProcessAdapter, ProcessExit};
use podcap_core::{CaptureRequest, CaptureSummary, InstanceId};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Result of [`CaptureRegistry::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: Option<u32> },
    AlreadyRunning,
    /// The tool could not be launched; nothing was recorded
    SpawnFailed(String),
}

/// Result of [`CaptureRegistry::stop`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Stopped(StopReport),
}

/// What happened while tearing one capture down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub instance: InstanceId,
    /// `None` when the exit could not be observed
    pub exit: Option<ProcessExit>,
    /// Whether SIGKILL was needed
    pub killed: bool,
    pub removed: Vec<PathBuf>,
}

impl StopReport {
    /// The tool had already exited with a failure code before it was
    /// stopped (bad interface, missing permissions, full disk).
    pub fn tool_failed(&self) -> bool {
        self.exit
            .is_some_and(|exit| exit.code.is_some() && !exit.success())
    }
}

struct CaptureHandle<P> {
    process: P,
    pid: Option<u32>,
    max_files: String,
    output: PathBuf,
    started_at_ms: u64,
}

pub struct CaptureRegistry<A: ProcessAdapter> {
    adapter: A,
    config: CaptureConfig,
    captures: Mutex<BTreeMap<InstanceId, CaptureHandle<A::Process>>>,
}

impl<A: ProcessAdapter> CaptureRegistry<A> {
    pub fn new(adapter: A, config: CaptureConfig) -> Self {
        Self {
            adapter,
            config,
            captures: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Launch a capture for the instance unless one is already running.
    pub async fn start(&self, request: &CaptureRequest) -> StartOutcome {
        let mut captures = self.captures.lock().await;
        if captures.contains_key(&request.instance) {
            return StartOutcome::AlreadyRunning;
        }

        let spec = self.config.process_spec(request);
        let process = match self.adapter.spawn(&spec).await {
            Ok(process) => process,
            Err(e) => {
                warn!(
                    instance = %request.instance,
                    command = %spec.command_line(),
                    error = %e,
                    "failed to start capture"
                );
                return StartOutcome::SpawnFailed(e.to_string());
            }
        };

        let pid = self.adapter.pid(&process);
        let output = self.config.layout.output_path(&request.instance);
        info!(
            instance = %request.instance,
            pid = ?pid,
            max_files = %request.max_files,
            output = %output.display(),
            "capture started"
        );
        captures.insert(
            request.instance.clone(),
            CaptureHandle {
                process,
                pid,
                max_files: request.max_files.clone(),
                output,
                started_at_ms: now_ms(),
            },
        );
        StartOutcome::Started { pid }
    }

    /// Stop the instance's capture and delete its artifacts.
    pub async fn stop(&self, id: &InstanceId) -> StopOutcome {
        let mut captures = self.captures.lock().await;
        let Some(handle) = captures.remove(id) else {
            return StopOutcome::NotRunning;
        };
        StopOutcome::Stopped(self.teardown(id, handle).await)
    }

    /// Stop every capture. Used at shutdown.
    pub async fn drain_all(&self) -> Vec<StopReport> {
        let mut captures = self.captures.lock().await;
        let drained = std::mem::take(&mut *captures);
        if !drained.is_empty() {
            info!(count = drained.len(), "stopping all captures");
        }

        let mut reports = Vec::with_capacity(drained.len());
        for (id, handle) in drained {
            reports.push(self.teardown(&id, handle).await);
        }
        reports
    }

    pub async fn is_capturing(&self, id: &InstanceId) -> bool {
        self.captures.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.captures.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.captures.lock().await.is_empty()
    }

    /// Live captures ordered by instance id
    pub async fn summaries(&self) -> Vec<CaptureSummary> {
        self.captures
            .lock()
            .await
            .iter()
            .map(|(id, handle)| CaptureSummary {
                instance: id.clone(),
                pid: handle.pid,
                max_files: handle.max_files.clone(),
                output: handle.output.clone(),
                started_at_ms: handle.started_at_ms,
            })
            .collect()
    }

    async fn teardown(&self, id: &InstanceId, mut handle: CaptureHandle<A::Process>) -> StopReport {
        let mut killed = false;
        let mut signalled = true;

        if let Err(e) = self.adapter.terminate(&mut handle.process).await {
            warn!(instance = %id, pid = ?handle.pid, error = %e, "SIGTERM failed, killing capture");
            match self.adapter.kill(&mut handle.process).await {
                Ok(()) => killed = true,
                Err(e) => {
                    warn!(instance = %id, pid = ?handle.pid, error = %e, "failed to kill capture");
                    signalled = false;
                }
            }
        }

        let exit = if signalled {
            self.await_exit(id, &mut handle.process, &mut killed).await
        } else {
            None
        };

        let removed = self.config.layout.remove_all(id);
        let report = StopReport {
            instance: id.clone(),
            exit,
            killed,
            removed,
        };
        if report.tool_failed() {
            warn!(instance = %id, pid = ?handle.pid, exit = ?exit, "capture tool had exited with an error");
        }
        info!(
            instance = %id,
            exit = %exit.map(|e| e.to_string()).unwrap_or_else(|| "unknown".to_string()),
            killed,
            removed = report.removed.len(),
            "capture stopped"
        );
        report
    }

    async fn await_exit(
        &self,
        id: &InstanceId,
        process: &mut A::Process,
        killed: &mut bool,
    ) -> Option<ProcessExit> {
        let result = match self.config.stop_timeout {
            None => self.adapter.wait(process).await,
            Some(limit) => {
                let waited = tokio::time::timeout(limit, self.adapter.wait(process)).await;
                match waited {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            instance = %id,
                            timeout_ms = limit.as_millis() as u64,
                            "capture ignored SIGTERM, killing"
                        );
                        if let Err(e) = self.adapter.kill(process).await {
                            warn!(instance = %id, error = %e, "failed to kill capture");
                            return None;
                        }
                        *killed = true;
                        self.adapter.wait(process).await
                    }
                }
            }
        };

        match result {
            Ok(exit) => Some(exit),
            Err(e) => {
                warn!(instance = %id, error = %e, "failed to wait for capture exit");
                None
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
