// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod capture agent (podcapd)
//!
//! Node-local process that starts and stops packet captures for workload
//! instances as their lifecycle events arrive.
//!
//! Architecture:
//! - Listener Task: Spawned task handling socket I/O, queues events on the EventBus
//! - Engine Loop: Main task reconciling events sequentially

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod event_bus;
mod lifecycle;
mod listener;
mod settings;

use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("podcapd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("podcapd {VERSION}");
                println!("Pod capture agent - runs one packet capture per annotated pod on this node");
                println!();
                println!("USAGE:");
                println!("    podcapd");
                println!();
                println!("Events are delivered over a Unix socket in the state directory,");
                println!("usually by a cluster watcher or `podcap emit`.");
                println!();
                println!("ENVIRONMENT:");
                println!("    NODE_NAME                   Node this agent serves (required)");
                println!("    PODCAP_STATE_DIR            State directory (socket, pid, log, config.toml)");
                println!("    PODCAP_CONFIG               Alternate config file");
                println!("    PODCAP_CAPTURE_TOOL         Capture binary (default: tcpdump)");
                println!("    PODCAP_CAPTURE_INTERFACE    Interface to capture on (default: any)");
                println!("    PODCAP_CAPTURE_DIR          Directory for capture files (default: /tmp)");
                println!("    PODCAP_ANNOTATION           Annotation that requests a capture");
                println!("    PODCAP_STOP_TIMEOUT_MS      SIGKILL a capture this long after SIGTERM");
                println!("    RUST_LOG                    Log filter (default: info)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: podcapd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    // Configuration errors are fatal before anything is touched
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("podcapd: {e}");
            std::process::exit(1);
        }
    };

    // Write startup marker to log (before tracing setup)
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!(node = %config.node, "Starting capture agent");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
        event_bus,
        mut event_reader,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("podcapd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start agent: {}", e);
            drop(log_guard);
            eprintln!("podcapd: {e}");
            std::process::exit(1);
        }
    };

    let shutdown_notify = Arc::new(Notify::new());

    // Spawn listener task
    let listener = Listener::new(
        unix_listener,
        ListenCtx {
            event_bus,
            registry: Arc::clone(daemon.registry()),
            node: config.node.clone(),
            start_time: daemon.start_time,
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    let listener_task = tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Agent ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process
    println!("READY");

    // Engine loop - reconciles events sequentially in arrival order
    loop {
        tokio::select! {
            event = event_reader.recv() => {
                match event {
                    Some(event) => {
                        daemon.process_event(event).await;
                    }
                    None => {
                        info!("Event bus closed, shutting down...");
                        break;
                    }
                }
            }

            _ = shutdown_notify.notified() => {
                info!("Shutdown requested via command");
                break;
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown(&mut event_reader, listener_task).await;
    info!("Agent stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- podcapd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- podcapd: starting (pid: ";

/// Rotate the log once it grows past this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated logs kept (daemon.log.1 .. daemon.log.3)
const MAX_ROTATIONS: u32 = 3;

/// Shift `daemon.log` to `daemon.log.1` (and older rotations up) when it
/// is too large. Failures are ignored; logging setup recreates the file.
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(meta) = std::fs::metadata(log_path) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }

    let rotated = |n: u32| {
        let mut name = log_path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };

    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(n + 1));
        }
    }
    let _ = std::fs::rename(log_path, rotated(1));
}

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start agent: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
