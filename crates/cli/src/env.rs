// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Resolve state directory: PODCAP_STATE_DIR > XDG_STATE_HOME/podcap > ~/.local/state/podcap
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("PODCAP_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("podcap"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/podcap"))
}

pub fn timeout_ipc_ms() -> Option<Duration> {
    parse_duration_ms("PODCAP_TIMEOUT_IPC_MS")
}

pub fn wait_poll_ms() -> Option<Duration> {
    parse_duration_ms("PODCAP_WAIT_POLL_MS")
}
