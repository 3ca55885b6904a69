// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture artifact naming and cleanup.
//!
//! Each instance writes to `<dir>/capture-<id>.pcap`. The capture tool
//! rotates into numbered siblings (`capture-<id>.pcap0`, `...pcap1`), so
//! cleanup globs `capture-<id>.pcap*` and keeps only the output file and
//! its numeric rotations. `capture-a.pcap.pcap` belongs to instance
//! `a.pcap`, not `a`.
//!
//! Cleanup failures are logged per file and never propagate.

use podcap_core::InstanceId;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default directory for capture output
pub const DEFAULT_CAPTURE_DIR: &str = "/tmp";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Deterministic artifact paths keyed by instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_DIR)
    }
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name the capture tool is told to write
    pub fn file_name(id: &InstanceId) -> String {
        // Keep namespaced ids inside the capture dir
        format!("capture-{}.pcap", id.file_safe())
    }

    pub fn output_path(&self, id: &InstanceId) -> PathBuf {
        self.dir.join(Self::file_name(id))
    }

    /// Glob matching the output file and all of its rotated segments
    pub fn pattern(&self, id: &InstanceId) -> String {
        let output = self.output_path(id);
        format!("{}*", glob::Pattern::escape(&output.to_string_lossy()))
    }

    /// Existing artifacts for an instance, sorted
    pub fn list(&self, id: &InstanceId) -> Result<Vec<PathBuf>, ArtifactError> {
        let pattern = self.pattern(id);
        let entries = glob::glob(&pattern).map_err(|source| ArtifactError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if Self::is_segment(&path, id) => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!(instance = %id, error = %e, "unreadable capture artifact"),
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Output file itself or one of its numbered rotations
    fn is_segment(path: &Path, id: &InstanceId) -> bool {
        let base = Self::file_name(id);
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match name.strip_prefix(base.as_str()) {
            Some(suffix) => suffix.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }

    /// Delete every artifact for an instance, returning the paths removed.
    pub fn remove_all(&self, id: &InstanceId) -> Vec<PathBuf> {
        let paths = match self.list(id) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(instance = %id, error = %e, "failed to list capture artifacts");
                return Vec::new();
            }
        };

        let mut removed = Vec::with_capacity(paths.len());
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(instance = %id, path = %path.display(), "deleted capture artifact");
                    removed.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(instance = %id, path = %path.display(), "artifact already gone");
                }
                Err(e) => {
                    warn!(
                        instance = %id,
                        path = %path.display(),
                        error = %e,
                        "failed to delete capture artifact"
                    );
                }
            }
        }
        removed
    }
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
