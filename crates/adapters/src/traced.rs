// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{ProcessAdapter, ProcessError, ProcessExit, ProcessSpec};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    type Process = P::Process;

    async fn spawn(&self, spec: &ProcessSpec) -> Result<Self::Process, ProcessError> {
        async {
            tracing::info!(command = %spec.command_line(), env_count = spec.env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(process) => {
                    tracing::info!(pid = ?self.inner.pid(process), elapsed_ms, "process spawned")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("process.spawn", program = %spec.program))
        .await
    }

    fn pid(&self, process: &Self::Process) -> Option<u32> {
        self.inner.pid(process)
    }

    async fn terminate(&self, process: &mut Self::Process) -> Result<(), ProcessError> {
        let pid = self.inner.pid(process);
        let result = self.inner.terminate(process).await;
        tracing::info_span!("process.terminate", ?pid).in_scope(|| match &result {
            Ok(()) => tracing::info!("sent SIGTERM"),
            Err(e) => tracing::warn!(error = %e, "terminate failed"),
        });
        result
    }

    async fn kill(&self, process: &mut Self::Process) -> Result<(), ProcessError> {
        let pid = self.inner.pid(process);
        let result = self.inner.kill(process).await;
        tracing::info_span!("process.kill", ?pid).in_scope(|| match &result {
            Ok(()) => tracing::info!("sent SIGKILL"),
            Err(e) => tracing::warn!(error = %e, "kill failed"),
        });
        result
    }

    async fn wait(&self, process: &mut Self::Process) -> Result<ProcessExit, ProcessError> {
        let pid = self.inner.pid(process);
        let start = std::time::Instant::now();
        let result = self.inner.wait(process).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info_span!("process.wait", ?pid).in_scope(|| match &result {
            Ok(exit) => tracing::info!(%exit, elapsed_ms, "exited"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "wait failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
