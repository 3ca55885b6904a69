//! Test helpers for black-box behavior tests.
//!
//! Provides a small DSL for driving the podcap CLI against a real podcapd.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

// Aggressive timeouts for fast tests.
//
// IMPORTANT:
//   Do NOT change these.
//   File a performance bug instead.
const PODCAP_TIMEOUT_IPC_MS: &str = "2000";
const PODCAP_WAIT_POLL_MS: &str = "10";
const PODCAP_STOP_TIMEOUT_MS: &str = "2000";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Node name every spec agent runs as
pub const NODE: &str = "node-1";

/// Stand-in for tcpdump: creates the output file plus one rotation, then
/// idles until signalled.
const FAKE_CAPTURE_TOOL: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -w) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
: > "$out"
: > "${out}1"
exec sleep 60
"#;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Returns the path to the podcap binary.
pub fn podcap_binary() -> PathBuf {
    binary_path("podcap")
}

/// Returns the path to the podcapd agent binary.
pub fn podcapd_binary() -> PathBuf {
    binary_path("podcapd")
}

/// Environment variables the agent and CLI read. Cleared on every spawned
/// command so the caller's shell cannot leak into a spec.
const AMBIENT_VARS: &[&str] = &[
    "NODE_NAME",
    "PODCAP_STATE_DIR",
    "PODCAP_CONFIG",
    "PODCAP_CAPTURE_TOOL",
    "PODCAP_CAPTURE_INTERFACE",
    "PODCAP_CAPTURE_DIR",
    "PODCAP_ANNOTATION",
    "PODCAP_STOP_TIMEOUT_MS",
];

/// Create a CLI builder for podcap commands
pub fn cli() -> CliBuilder {
    CliBuilder::new(podcap_binary())
}

/// Create a builder that runs podcapd in the foreground
pub fn podcapd() -> CliBuilder {
    CliBuilder::new(podcapd_binary())
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
}

impl CliBuilder {
    fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            envs: vec![
                ("PODCAP_TIMEOUT_IPC_MS".into(), PODCAP_TIMEOUT_IPC_MS.into()),
                ("PODCAP_WAIT_POLL_MS".into(), PODCAP_WAIT_POLL_MS.into()),
            ],
            stdin: None,
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Feed text to the command's stdin
    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    /// Build the command without running it
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for var in AMBIENT_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn output(self) -> Output {
        let mut cmd = self.command();
        let Some(input) = self.stdin else {
            return cmd.output().expect("command should run");
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().expect("command should spawn");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().expect("command should run")
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.output();
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    /// Assert stdout contains substring.
    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    /// Assert stdout does not contain substring.
    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    /// Assert stderr contains substring.
    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Agent
// =============================================================================

/// Isolated state and capture directories, plus the fake capture tool.
pub struct Sandbox {
    state_dir: tempfile::TempDir,
    capture_dir: tempfile::TempDir,
    tool: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let state_dir = tempfile::tempdir().unwrap();
        let capture_dir = tempfile::tempdir().unwrap();
        let tool = state_dir.path().join("fake-tcpdump");
        std::fs::write(&tool, FAKE_CAPTURE_TOOL).unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self {
            state_dir,
            capture_dir,
            tool,
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn capture_path(&self) -> &Path {
        self.capture_dir.path()
    }

    /// podcapd configured for this sandbox
    pub fn podcapd(&self) -> CliBuilder {
        podcapd()
            .env("NODE_NAME", NODE)
            .env("PODCAP_STATE_DIR", self.state_path())
            .env("PODCAP_CAPTURE_TOOL", &self.tool)
            .env("PODCAP_CAPTURE_DIR", self.capture_path())
            .env("PODCAP_STOP_TIMEOUT_MS", PODCAP_STOP_TIMEOUT_MS)
    }

    /// podcap pointed at this sandbox's agent
    pub fn podcap(&self) -> CliBuilder {
        cli().env("PODCAP_STATE_DIR", self.state_path())
    }

    /// Write `config.toml` in the state directory
    pub fn config(&self, content: &str) {
        std::fs::write(self.state_path().join("config.toml"), content).unwrap();
    }

    /// Sorted capture file names currently on disk
    pub fn capture_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.capture_path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Read the agent log (for debugging failures)
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }
}

/// A running podcapd. Shut down (and reaped) on drop.
pub struct Agent {
    sandbox: Sandbox,
    child: Option<Child>,
}

impl Agent {
    /// Start podcapd and wait for its socket
    pub fn start() -> Self {
        Self::start_in(Sandbox::new())
    }

    pub fn start_in(sandbox: Sandbox) -> Self {
        let child = sandbox
            .podcapd()
            .command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("podcapd should spawn");
        let agent = Self {
            sandbox,
            child: Some(child),
        };

        let socket = agent.sandbox.state_path().join("daemon.sock");
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || socket.exists()),
            "podcapd did not come up\nlog: {}",
            agent.sandbox.daemon_log()
        );
        agent
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn podcap(&self) -> CliBuilder {
        self.sandbox.podcap()
    }

    /// Wait until the capture files match `expected`
    pub fn wait_for_files(&self, expected: &[&str]) {
        let found = wait_for(SPEC_WAIT_MAX_MS, || self.sandbox.capture_files() == expected);
        assert!(
            found,
            "expected capture files {:?}, found {:?}\nlog: {}",
            expected,
            self.sandbox.capture_files(),
            self.sandbox.daemon_log()
        );
    }

    /// Wait for the agent process to exit, returning whether it exited cleanly
    pub fn wait_exit(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return true;
        };
        let mut status = None;
        wait_for(SPEC_WAIT_MAX_MS, || {
            status = child.try_wait().ok().flatten();
            status.is_some()
        });
        self.child = None;
        status.is_some_and(|s| s.success())
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        // Graceful first, so capture processes are reaped
        let mut cmd = self.podcap().args(&["shutdown", "--wait"]).command();
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        let _ = cmd.status();
        let _ = child.kill();
        let _ = child.wait();
    }
}
