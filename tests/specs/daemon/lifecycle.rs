//! Agent startup and shutdown specs

use crate::prelude::*;

#[test]
fn podcapd_requires_node_name() {
    let sandbox = Sandbox::new();
    let mut cmd = sandbox.podcapd().command();
    cmd.env_remove("NODE_NAME");
    let output = cmd.output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NODE_NAME must be set"), "stderr: {stderr}");
    assert!(!sandbox.state_path().join("daemon.sock").exists());
}

#[test]
fn podcapd_rejects_malformed_config() {
    let sandbox = Sandbox::new();
    sandbox.config("[capture\nfile_size_mb = ");
    sandbox
        .podcapd()
        .fails()
        .stderr_has("Invalid configuration");
}

#[test]
fn podcapd_rejects_unknown_config_keys() {
    let sandbox = Sandbox::new();
    sandbox.config("[capture]\nsnaplen = 96\n");
    sandbox
        .podcapd()
        .fails()
        .stderr_has("Invalid configuration");
}

#[test]
fn second_agent_refuses_to_start() {
    let agent = Agent::start();
    agent
        .sandbox()
        .podcapd()
        .fails()
        .stderr_has("podcapd is already running");
}

#[test]
fn ping_answers_pong() {
    let agent = Agent::start();
    agent.podcap().args(&["ping"]).passes().stdout_has("pong");
}

#[test]
fn status_reports_node_with_no_captures() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["status"])
        .passes()
        .stdout_has(&format!("podcapd on {NODE}"))
        .stdout_has("No active captures");
}

#[test]
fn status_json() {
    let agent = Agent::start();
    let out = agent.podcap().args(&["status", "-o", "json"]).passes().stdout();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["node"], NODE);
    assert_eq!(json["captures"], serde_json::json!([]));
}

#[test]
fn shutdown_wait_removes_socket_and_exits() {
    let mut agent = Agent::start();
    agent
        .podcap()
        .args(&["shutdown", "--wait"])
        .passes()
        .stdout_has("podcapd stopped");

    assert!(!agent.sandbox().state_path().join("daemon.sock").exists());
    assert!(agent.wait_exit(), "podcapd should exit cleanly");
}

#[test]
fn agent_writes_startup_marker_to_log() {
    let agent = Agent::start();
    let log = agent.sandbox().daemon_log();
    assert!(log.contains("--- podcapd: starting (pid: "), "log: {log}");
}
