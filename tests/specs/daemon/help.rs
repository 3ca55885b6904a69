//! Agent help and version specs
//!
//! Verify podcapd --help and --version work without configuration or
//! acquiring the lock.

use crate::prelude::*;

#[test]
fn podcapd_version() {
    podcapd()
        .args(&["--version"])
        .passes()
        .stdout_eq(&format!("podcapd {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn podcapd_short_version() {
    podcapd()
        .args(&["-v"])
        .passes()
        .stdout_has("podcapd ");
}

#[test]
fn podcapd_help_shows_usage_and_environment() {
    podcapd()
        .args(&["--help"])
        .passes()
        .stdout_has("USAGE:")
        .stdout_has("NODE_NAME")
        .stdout_has("PODCAP_CAPTURE_TOOL")
        .stdout_has("--version");
}

#[test]
fn podcapd_rejects_unknown_argument() {
    podcapd()
        .args(&["--bogus"])
        .fails()
        .stderr_has("unexpected argument '--bogus'");
}
