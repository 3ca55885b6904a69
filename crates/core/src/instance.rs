// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workload instance snapshots as delivered by the event source

use crate::capture::CaptureRequest;
use crate::id::InstanceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Annotation that requests a capture. Its value is the rotation limit.
pub const CAPTURE_ANNOTATION: &str = "tcpdump.antrea.io";

/// Lifecycle phase of an instance, named after pod phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// Only running instances have live traffic worth capturing.
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase '{0}' (expected Pending, Running, Succeeded, Failed or Unknown)")]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    /// Case-insensitive, so `running` and `Running` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Phase::Pending),
            "running" => Ok(Phase::Running),
            "succeeded" => Ok(Phase::Succeeded),
            "failed" => Ok(Phase::Failed),
            "unknown" => Ok(Phase::Unknown),
            _ => Err(ParsePhaseError(s.to_string())),
        }
    }
}

/// Current declared state of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: InstanceId,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Node the instance is scheduled on, when the source reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl InstanceSnapshot {
    pub fn new(id: impl Into<InstanceId>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::default(),
            annotations: BTreeMap::new(),
            node: None,
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// The capture request this snapshot declares under `key`, if any.
    ///
    /// An empty annotation value counts as absent. Any other value is passed
    /// through to the capture tool unvalidated.
    pub fn capture_request(&self, key: &str) -> Option<CaptureRequest> {
        let value = self.annotations.get(key)?;
        if value.trim().is_empty() {
            return None;
        }
        Some(CaptureRequest {
            instance: self.id.clone(),
            max_files: value.clone(),
        })
    }

    /// False only when the snapshot names a node other than `node`.
    pub fn is_on_node(&self, node: &str) -> bool {
        self.node.as_deref().is_none_or(|n| n == node)
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
