// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podcap-core: Core types for the pod capture agent

pub mod capture;
pub mod event;
pub mod id;
pub mod instance;

pub use capture::{CaptureRequest, CaptureSummary};
pub use event::LifecycleEvent;
pub use id::InstanceId;
pub use instance::{InstanceSnapshot, ParsePhaseError, Phase, CAPTURE_ANNOTATION};
