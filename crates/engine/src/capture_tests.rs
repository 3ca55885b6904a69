// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use podcap_core::InstanceId;

fn request(id: &str, max_files: &str) -> CaptureRequest {
    CaptureRequest {
        instance: InstanceId::new(id),
        max_files: max_files.to_string(),
    }
}

#[test]
fn default_command_line() {
    let spec = CaptureConfig::default().process_spec(&request("a", "3"));
    assert_eq!(
        spec.command_line(),
        "tcpdump -C 1 -W 3 -w /tmp/capture-a.pcap -i any"
    );
    assert!(spec.env.is_empty());
}

#[test]
fn max_files_is_passed_through_unvalidated() {
    let spec = CaptureConfig::default().process_spec(&request("a", "lots"));
    assert_eq!(spec.args[2..4], ["-W".to_string(), "lots".to_string()]);
}

#[test]
fn custom_config_flows_into_arguments() {
    let config = CaptureConfig {
        tool: "/usr/local/bin/fakecap".to_string(),
        interface: "eth0".to_string(),
        file_size_mb: 50,
        layout: ArtifactLayout::new("/var/captures"),
        stop_timeout: Some(Duration::from_secs(5)),
    };
    let spec = config.process_spec(&request("prod/web-0", "10"));
    assert_eq!(spec.program, "/usr/local/bin/fakecap");
    assert_eq!(
        spec.args,
        vec![
            "-C",
            "50",
            "-W",
            "10",
            "-w",
            "/var/captures/capture-prod_web-0.pcap",
            "-i",
            "eth0"
        ]
    );
}
