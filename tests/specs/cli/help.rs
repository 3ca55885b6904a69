//! CLI help and version specs

use crate::prelude::*;

#[test]
fn podcap_without_args_prints_help() {
    cli()
        .passes()
        .stdout_has("Usage: podcap")
        .stdout_has("emit")
        .stdout_has("status")
        .stdout_has("shutdown");
}

#[test]
fn podcap_version() {
    cli()
        .args(&["--version"])
        .passes()
        .stdout_eq(&format!("podcap {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn emit_help_lists_event_kinds() {
    cli()
        .args(&["emit", "--help"])
        .passes()
        .stdout_has("added")
        .stdout_has("updated")
        .stdout_has("deleted")
        .stdout_has("stream");
}

#[test]
fn emit_added_help_shows_instance_flags() {
    cli()
        .args(&["emit", "added", "--help"])
        .passes()
        .stdout_has("--phase")
        .stdout_has("--annotation")
        .stdout_has("--node");
}

#[test]
fn output_flag_accepts_json() {
    assert_cmd::Command::new(podcap_binary())
        .args(["--output", "json", "--help"])
        .assert()
        .success();
}
