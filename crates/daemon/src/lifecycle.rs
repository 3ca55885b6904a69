// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle management: configuration, startup, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use podcap_adapters::{ProcessAdapter, SystemProcessAdapter, TracedProcess};
use podcap_core::LifecycleEvent;
use podcap_engine::{CaptureRegistry, Reconciled, Reconciler, StartOutcome, StopOutcome};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::env;
use crate::event_bus::{EventBus, EventReader, EVENT_QUEUE_CAPACITY};
use crate::settings::{Overrides, Settings};

/// Process adapter used in production (wrapped with tracing)
pub type DaemonAdapter = TracedProcess<SystemProcessAdapter>;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/podcap)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to agent log file
    pub log_path: PathBuf,
    /// Path to the optional settings file
    pub config_path: PathBuf,
    /// Node this agent captures for
    pub node: String,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the environment and the settings file.
    ///
    /// Uses fixed paths under `~/.local/state/podcap/` (or `$XDG_STATE_HOME/podcap/`).
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let node = env::node_name().ok_or(LifecycleError::NoNodeName)?;
        let config_path = env::config_path().unwrap_or_else(|| state_dir.join("config.toml"));
        let settings = Settings::load(&config_path, Overrides::from_env())?;
        Ok(Self::with_settings(state_dir, node, config_path, settings))
    }

    pub fn with_settings(
        state_dir: PathBuf,
        node: String,
        config_path: PathBuf,
        settings: Settings,
    ) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            config_path,
            node,
            settings,
            state_dir,
        }
    }
}

/// Agent state during operation.
pub struct DaemonState<A: ProcessAdapter> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub reconciler: Arc<Reconciler<A>>,
    pub start_time: Instant,
}

/// Result of startup: the agent state plus the pieces the main loop wires up.
pub struct StartupResult<A: ProcessAdapter> {
    pub daemon: DaemonState<A>,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
    pub event_bus: EventBus,
    /// Event reader for the engine loop
    pub event_reader: EventReader,
}

impl<A: ProcessAdapter> DaemonState<A> {
    pub fn registry(&self) -> &Arc<CaptureRegistry<A>> {
        self.reconciler.registry()
    }

    /// Reconcile one lifecycle event.
    pub async fn process_event(&self, event: LifecycleEvent) -> Reconciled {
        let summary = event.log_summary();
        let outcome = self.reconciler.handle_event(&event).await;
        match &outcome {
            Reconciled::Start(StartOutcome::SpawnFailed(reason)) => {
                warn!(event = %summary, reason = %reason, "capture not started");
            }
            Reconciled::Start(StartOutcome::Started { .. })
            | Reconciled::Stop(StopOutcome::Stopped(_)) => {
                info!(event = %summary, "capture state changed");
            }
            _ => debug!(event = %summary, outcome = ?outcome, "no capture change"),
        }
        outcome
    }

    /// Shut the agent down.
    ///
    /// Order matters: intake closes first, then every capture is stopped
    /// and cleaned up, and only then is the socket released.
    pub async fn shutdown(&mut self, event_reader: &mut EventReader, listener: JoinHandle<()>) {
        info!("Shutting down agent...");

        // 1. Stop accepting events
        let dropped = event_reader.close();
        if dropped > 0 {
            warn!(dropped, "discarded queued events at shutdown");
        }

        // 2. Stop every capture (blocks until each tool exits)
        self.reconciler.shutdown().await;

        // 3. Release the event source
        listener.abort();
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 4. Remove PID file (lock is released when self.lock_file drops)
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!("Agent shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("NODE_NAME must be set to the name of this node")]
    NoNodeName,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config {0}: {1}")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to acquire lock: agent already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the agent with the production process adapter
pub async fn startup(config: &Config) -> Result<StartupResult<DaemonAdapter>, LifecycleError> {
    startup_with(config, TracedProcess::new(SystemProcessAdapter::new())).await
}

/// Start the agent with the given process adapter
pub async fn startup_with<A: ProcessAdapter>(
    config: &Config,
    adapter: A,
) -> Result<StartupResult<A>, LifecycleError> {
    match startup_inner(config, adapter).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // those files belong to the running agent.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner<A: ProcessAdapter>(
    config: &Config,
    adapter: A,
) -> Result<StartupResult<A>, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races.
    // Open without truncating so a running agent's PID survives.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Build the registry and reconciler
    let capture = &config.settings.capture;
    info!(
        node = %config.node,
        config = %config.config_path.display(),
        tool = %capture.tool,
        interface = %capture.interface,
        file_size_mb = capture.file_size_mb,
        output_dir = %capture.layout.dir().display(),
        annotation = %config.settings.annotation,
        stop_timeout_ms = ?capture.stop_timeout.map(|t| t.as_millis()),
        "capture settings"
    );
    let registry = Arc::new(CaptureRegistry::new(adapter, capture.clone()));
    let reconciler = Reconciler::new(registry)
        .with_annotation(config.settings.annotation.clone())
        .with_node(config.node.clone());

    let (event_bus, event_reader) = EventBus::new(EVENT_QUEUE_CAPACITY);

    // 4. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            reconciler: Arc::new(reconciler),
            start_time: Instant::now(),
        },
        listener,
        event_bus,
        event_reader,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
