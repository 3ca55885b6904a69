// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture settings: optional `config.toml` plus environment overrides.
//!
//! ```toml
//! [capture]
//! tool = "tcpdump"
//! interface = "any"
//! file_size_mb = 1
//! output_dir = "/tmp"
//! annotation = "tcpdump.antrea.io"
//! stop_timeout_ms = 30000
//! ```
//!
//! Every key is optional. Environment variables win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use podcap_core::CAPTURE_ANNOTATION;
use podcap_engine::{ArtifactLayout, CaptureConfig};
use serde::Deserialize;

use crate::env;
use crate::lifecycle::LifecycleError;

/// Parsed `config.toml`
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub capture: CaptureSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CaptureSection {
    pub tool: Option<String>,
    pub interface: Option<String>,
    pub file_size_mb: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub annotation: Option<String>,
    pub stop_timeout_ms: Option<u64>,
}

/// Environment overrides, captured once so resolution stays pure
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub tool: Option<String>,
    pub interface: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub annotation: Option<String>,
    pub stop_timeout_ms: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            tool: env::capture_tool(),
            interface: env::capture_interface(),
            output_dir: env::capture_dir(),
            annotation: env::annotation(),
            stop_timeout_ms: env::stop_timeout_ms(),
        }
    }
}

/// Effective capture settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub capture: CaptureConfig,
    /// Annotation key that requests a capture
    pub annotation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            annotation: CAPTURE_ANNOTATION.to_string(),
        }
    }
}

impl Settings {
    /// Load from `path` if it exists, then apply overrides and validate.
    ///
    /// A missing file is fine; an unreadable or malformed one is fatal.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, LifecycleError> {
        let file = match std::fs::read_to_string(path) {
            Ok(text) => parse(&text).map_err(|e| {
                LifecycleError::InvalidConfig(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
            Err(e) => return Err(LifecycleError::ConfigRead(path.to_path_buf(), e)),
        };
        Self::resolve(file, overrides)
    }

    pub fn resolve(file: SettingsFile, overrides: Overrides) -> Result<Self, LifecycleError> {
        let mut settings = Settings::default();
        let section = file.capture;
        let capture = &mut settings.capture;

        if let Some(tool) = overrides.tool.or(section.tool) {
            capture.tool = tool;
        }
        if let Some(interface) = overrides.interface.or(section.interface) {
            capture.interface = interface;
        }
        if let Some(size) = section.file_size_mb {
            capture.file_size_mb = size;
        }
        if let Some(dir) = overrides.output_dir.or(section.output_dir) {
            capture.layout = ArtifactLayout::new(dir);
        }
        if let Some(annotation) = overrides.annotation.or(section.annotation) {
            settings.annotation = annotation;
        }

        let timeout_ms = match overrides.stop_timeout_ms {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                LifecycleError::InvalidConfig(format!(
                    "PODCAP_STOP_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    raw
                ))
            })?),
            None => section.stop_timeout_ms,
        };
        // 0 means wait forever, same as unset
        capture.stop_timeout = timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), LifecycleError> {
        if self.capture.tool.trim().is_empty() {
            return Err(LifecycleError::InvalidConfig(
                "capture tool must not be empty".to_string(),
            ));
        }
        if self.capture.interface.trim().is_empty() {
            return Err(LifecycleError::InvalidConfig(
                "capture interface must not be empty".to_string(),
            ));
        }
        if self.capture.file_size_mb == 0 {
            return Err(LifecycleError::InvalidConfig(
                "file_size_mb must be at least 1".to_string(),
            ));
        }
        if self.capture.layout.dir().as_os_str().is_empty() {
            return Err(LifecycleError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }
        if self.annotation.trim().is_empty() {
            return Err(LifecycleError::InvalidConfig(
                "annotation must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse(text: &str) -> Result<SettingsFile, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
