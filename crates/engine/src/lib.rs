// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Capture lifecycle engine: registry of running captures and the
//! reconciler that drives it from lifecycle events

pub mod artifacts;
mod capture;
mod reconciler;
mod registry;

pub use artifacts::{ArtifactError, ArtifactLayout, DEFAULT_CAPTURE_DIR};
pub use capture::{CaptureConfig, DEFAULT_FILE_SIZE_MB, DEFAULT_INTERFACE, DEFAULT_TOOL};
pub use reconciler::{desired_capture, DesiredCapture, Reconciled, Reconciler};
pub use registry::{CaptureRegistry, StartOutcome, StopOutcome, StopReport};
