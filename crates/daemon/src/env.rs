// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: PODCAP_STATE_DIR > XDG_STATE_HOME/podcap > ~/.local/state/podcap
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("PODCAP_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("podcap"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/podcap"))
}

/// Name of the node this agent serves. Blank counts as unset.
pub fn node_name() -> Option<String> {
    non_empty("NODE_NAME")
}

/// Alternate config file location
pub fn config_path() -> Option<PathBuf> {
    non_empty("PODCAP_CONFIG").map(PathBuf::from)
}

pub fn capture_tool() -> Option<String> {
    non_empty("PODCAP_CAPTURE_TOOL")
}

pub fn capture_interface() -> Option<String> {
    non_empty("PODCAP_CAPTURE_INTERFACE")
}

pub fn capture_dir() -> Option<PathBuf> {
    non_empty("PODCAP_CAPTURE_DIR").map(PathBuf::from)
}

pub fn annotation() -> Option<String> {
    non_empty("PODCAP_ANNOTATION")
}

/// Raw stop timeout in milliseconds; validated by settings
pub fn stop_timeout_ms() -> Option<String> {
    non_empty("PODCAP_STOP_TIMEOUT_MS")
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
