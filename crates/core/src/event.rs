// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events for instances on this node

use crate::id::InstanceId;
use crate::instance::InstanceSnapshot;
use serde::{Deserialize, Serialize};

/// Typed lifecycle event from the event source.
///
/// Serializes with `{"type": "instance:added", "instance": {...}}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// Instance first observed, including resync of pre-existing instances
    #[serde(rename = "instance:added")]
    InstanceAdded { instance: InstanceSnapshot },

    #[serde(rename = "instance:updated")]
    InstanceUpdated { instance: InstanceSnapshot },

    /// Instance removed; carries its last known state
    #[serde(rename = "instance:deleted")]
    InstanceDeleted { instance: InstanceSnapshot },
}

impl LifecycleEvent {
    pub fn instance(&self) -> &InstanceSnapshot {
        match self {
            LifecycleEvent::InstanceAdded { instance }
            | LifecycleEvent::InstanceUpdated { instance }
            | LifecycleEvent::InstanceDeleted { instance } => instance,
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.instance().id
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::InstanceAdded { .. } => "instance:added",
            LifecycleEvent::InstanceUpdated { .. } => "instance:updated",
            LifecycleEvent::InstanceDeleted { .. } => "instance:deleted",
        }
    }

    pub fn log_summary(&self) -> String {
        let instance = self.instance();
        match self {
            LifecycleEvent::InstanceDeleted { .. } => {
                format!("{} id={}", self.name(), instance.id)
            }
            _ => format!(
                "{} id={} phase={} annotations={}",
                self.name(),
                instance.id,
                instance.phase,
                instance.annotations.len()
            ),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
