// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle reconciler: maps instance events onto capture start/stop.
//!
//! Each event is judged on the snapshot it carries alone. A running
//! instance with the capture annotation should be captured; anything
//! else that is running, or anything deleted, should not. Non-running
//! instances are left alone until they either run or disappear.

use crate::registry::{CaptureRegistry, StartOutcome, StopOutcome, StopReport};
use podcap_adapters::ProcessAdapter;
use podcap_core::{CaptureRequest, LifecycleEvent, CAPTURE_ANNOTATION};
use std::sync::Arc;
use tracing::{debug, info};

/// What a single event asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredCapture {
    Ignore,
    Capture(CaptureRequest),
    Release,
}

/// Decide the desired capture state for an event.
pub fn desired_capture(event: &LifecycleEvent, annotation: &str) -> DesiredCapture {
    if let LifecycleEvent::InstanceDeleted { .. } = event {
        return DesiredCapture::Release;
    }

    let instance = event.instance();
    if !instance.phase.is_running() {
        return DesiredCapture::Ignore;
    }
    match instance.capture_request(annotation) {
        Some(request) => DesiredCapture::Capture(request),
        None => DesiredCapture::Release,
    }
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Ignored,
    /// Snapshot belongs to another node
    ForeignNode,
    Start(StartOutcome),
    Stop(StopOutcome),
}

pub struct Reconciler<A: ProcessAdapter> {
    registry: Arc<CaptureRegistry<A>>,
    annotation: String,
    node: Option<String>,
}

impl<A: ProcessAdapter> Reconciler<A> {
    pub fn new(registry: Arc<CaptureRegistry<A>>) -> Self {
        Self {
            registry,
            annotation: CAPTURE_ANNOTATION.to_string(),
            node: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Only act on added/updated snapshots scheduled to `node` (or that
    /// don't say). Deletions are honoured from any node.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn registry(&self) -> &Arc<CaptureRegistry<A>> {
        &self.registry
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub async fn handle_event(&self, event: &LifecycleEvent) -> Reconciled {
        debug!(event = %event.log_summary(), "handling lifecycle event");

        // Removal always stops, whatever node the final snapshot names
        let deleted = matches!(event, LifecycleEvent::InstanceDeleted { .. });
        if let (Some(node), false) = (&self.node, deleted) {
            if !event.instance().is_on_node(node) {
                debug!(
                    instance = %event.id(),
                    node = ?event.instance().node,
                    "ignoring instance on another node"
                );
                return Reconciled::ForeignNode;
            }
        }

        match desired_capture(event, &self.annotation) {
            DesiredCapture::Ignore => Reconciled::Ignored,
            DesiredCapture::Capture(request) => {
                Reconciled::Start(self.registry.start(&request).await)
            }
            DesiredCapture::Release => Reconciled::Stop(self.registry.stop(event.id()).await),
        }
    }

    /// Stop every capture before the agent exits.
    pub async fn shutdown(&self) -> Vec<StopReport> {
        let reports = self.registry.drain_all().await;
        info!(stopped = reports.len(), "all captures stopped");
        reports
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
