//! CLI error reporting specs

use crate::prelude::*;

#[test]
fn status_without_agent_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .podcap()
        .args(&["status"])
        .fails()
        .stderr_has("Error: Daemon not running");
}

#[test]
fn emit_without_agent_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .podcap()
        .args(&["emit", "added", "web-0"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn emit_rejects_unknown_phase() {
    cli()
        .args(&["emit", "added", "web-0", "--phase", "sleeping"])
        .fails()
        .stderr_has("unknown phase 'sleeping'");
}

#[test]
fn emit_rejects_annotation_without_value() {
    cli()
        .args(&["emit", "added", "web-0", "-a", "tcpdump.antrea.io"])
        .fails()
        .stderr_has("expected KEY=VALUE");
}

#[test]
fn stream_reports_bad_line_number() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "stream"])
        .stdin("\n{\"type\":\"instance:exploded\"}\n")
        .fails()
        .stderr_has("invalid event on line 2");
}
