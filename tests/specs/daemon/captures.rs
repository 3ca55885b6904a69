//! Capture lifecycle specs
//!
//! Drive podcapd with lifecycle events and watch the capture files the
//! stand-in capture tool leaves in the capture directory.

use crate::prelude::*;

const ANNOTATION: &str = "tcpdump.antrea.io=3";
const WEB_FILES: &[&str] = &["capture-web-0.pcap", "capture-web-0.pcap1"];

#[test]
fn annotated_running_instance_starts_capture() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "added", "web-0", "-a", ANNOTATION, "--node", NODE])
        .passes();

    agent.wait_for_files(WEB_FILES);
    agent
        .podcap()
        .args(&["status"])
        .passes()
        .stdout_has("INSTANCE")
        .stdout_has("web-0")
        .stdout_has("capture-web-0.pcap");
}

#[test]
fn removing_annotation_stops_capture_and_deletes_files() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "added", "web-0", "-a", ANNOTATION])
        .passes();
    agent.wait_for_files(WEB_FILES);

    agent.podcap().args(&["emit", "updated", "web-0"]).passes();

    agent.wait_for_files(&[]);
    agent
        .podcap()
        .args(&["status"])
        .passes()
        .stdout_has("No active captures");
}

#[test]
fn deleting_instance_stops_capture() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "added", "web-0", "-a", ANNOTATION])
        .passes();
    agent.wait_for_files(WEB_FILES);

    agent
        .podcap()
        .args(&["emit", "deleted", "web-0", "-a", ANNOTATION])
        .passes();

    agent.wait_for_files(&[]);
}

#[test]
fn pending_instance_is_not_captured_until_running() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "added", "web-0", "-a", ANNOTATION, "--phase", "Pending"])
        .passes();
    agent
        .podcap()
        .args(&["emit", "added", "db-0", "-a", ANNOTATION])
        .passes();

    // Events are reconciled in order, so web-0 was already skipped
    agent.wait_for_files(&["capture-db-0.pcap", "capture-db-0.pcap1"]);

    agent
        .podcap()
        .args(&["emit", "updated", "web-0", "-a", ANNOTATION])
        .passes();
    agent.wait_for_files(&[
        "capture-db-0.pcap",
        "capture-db-0.pcap1",
        "capture-web-0.pcap",
        "capture-web-0.pcap1",
    ]);
}

#[test]
fn instances_on_other_nodes_are_ignored() {
    let agent = Agent::start();
    agent
        .podcap()
        .args(&["emit", "added", "web-0", "-a", ANNOTATION, "--node", "node-2"])
        .passes();
    agent
        .podcap()
        .args(&["emit", "added", "db-0", "-a", ANNOTATION, "--node", NODE])
        .passes();

    agent.wait_for_files(&["capture-db-0.pcap", "capture-db-0.pcap1"]);
}

#[test]
fn stream_forwards_every_event() {
    let agent = Agent::start();
    let events = concat!(
        r#"{"type":"instance:added","instance":{"id":"web-0","phase":"Running","annotations":{"tcpdump.antrea.io":"3"}}}"#,
        "\n\n",
        r#"{"type":"instance:deleted","instance":{"id":"web-0","phase":"Running"}}"#,
        "\n",
        r#"{"type":"instance:added","instance":{"id":"db-0","phase":"Running","annotations":{"tcpdump.antrea.io":"5"}}}"#,
        "\n",
    );

    agent
        .podcap()
        .args(&["emit", "stream"])
        .stdin(events)
        .passes()
        .stdout_eq("Emitted 3 event(s)\n");

    agent.wait_for_files(&["capture-db-0.pcap", "capture-db-0.pcap1"]);
}

#[test]
fn shutdown_stops_all_captures() {
    let mut agent = Agent::start();
    for id in ["a", "b"] {
        agent
            .podcap()
            .args(&["emit", "added", id, "-a", ANNOTATION])
            .passes();
    }
    agent.wait_for_files(&[
        "capture-a.pcap",
        "capture-a.pcap1",
        "capture-b.pcap",
        "capture-b.pcap1",
    ]);

    agent.podcap().args(&["shutdown", "--wait"]).passes();

    assert!(agent.sandbox().capture_files().is_empty());
    assert!(agent.wait_exit(), "podcapd should exit cleanly");
}
