// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture tool invocation

use crate::artifacts::ArtifactLayout;
use podcap_adapters::ProcessSpec;
use podcap_core::CaptureRequest;
use std::time::Duration;

pub const DEFAULT_TOOL: &str = "tcpdump";
pub const DEFAULT_INTERFACE: &str = "any";
pub const DEFAULT_FILE_SIZE_MB: u32 = 1;

/// How captures are launched and where they write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub tool: String,
    pub interface: String,
    /// Rotation size per output file, in megabytes
    pub file_size_mb: u32,
    pub layout: ArtifactLayout,
    /// Grace period after SIGTERM before escalating to SIGKILL.
    /// `None` waits for the tool indefinitely.
    pub stop_timeout: Option<Duration>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            interface: DEFAULT_INTERFACE.to_string(),
            file_size_mb: DEFAULT_FILE_SIZE_MB,
            layout: ArtifactLayout::default(),
            stop_timeout: None,
        }
    }
}

impl CaptureConfig {
    /// `<tool> -C <size> -W <max_files> -w <output> -i <interface>`
    pub fn process_spec(&self, request: &CaptureRequest) -> ProcessSpec {
        let output = self.layout.output_path(&request.instance);
        ProcessSpec::new(&self.tool)
            .arg("-C")
            .arg(self.file_size_mb.to_string())
            .arg("-W")
            .arg(&request.max_files)
            .arg("-w")
            .arg(output.to_string_lossy())
            .arg("-i")
            .arg(&self.interface)
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
