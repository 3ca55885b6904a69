// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture requests and live capture summaries

use crate::id::InstanceId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Desire for one instance to be captured.
///
/// There is no partial request: the latest observed snapshot either
/// carries one or it doesn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub instance: InstanceId,
    /// Rotation limit handed to the capture tool as-is
    pub max_files: String,
}

/// Read-only view of a live capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub instance: InstanceId,
    #[serde(default)]
    pub pid: Option<u32>,
    pub max_files: String,
    pub output: PathBuf,
    pub started_at_ms: u64,
}
