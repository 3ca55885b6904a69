// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Emit lifecycle events to the agent, by hand or from a watcher pipe

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use podcap_core::{InstanceSnapshot, LifecycleEvent, Phase};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::DaemonClient;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct EmitArgs {
    #[command(subcommand)]
    pub command: EmitCommand,
}

#[derive(Subcommand)]
pub enum EmitCommand {
    /// An instance was observed for the first time
    Added(InstanceArgs),
    /// An instance's phase or annotations changed
    Updated(InstanceArgs),
    /// An instance was removed
    Deleted(InstanceArgs),
    /// Forward newline-delimited JSON events from stdin
    Stream,
}

#[derive(Args, Debug)]
pub struct InstanceArgs {
    /// Instance (pod) name
    pub id: String,

    /// Lifecycle phase: Pending, Running, Succeeded, Failed, Unknown
    #[arg(long, default_value = "Running")]
    pub phase: Phase,

    /// Annotation as key=value (repeatable)
    #[arg(long = "annotation", short = 'a', value_name = "KEY=VALUE", value_parser = parse_annotation)]
    pub annotations: Vec<(String, String)>,

    /// Node the instance is scheduled on
    #[arg(long)]
    pub node: Option<String>,
}

impl InstanceArgs {
    fn snapshot(self) -> InstanceSnapshot {
        let mut snapshot = InstanceSnapshot::new(self.id).with_phase(self.phase);
        for (key, value) in self.annotations {
            snapshot = snapshot.with_annotation(key, value);
        }
        if let Some(node) = self.node {
            snapshot = snapshot.on_node(node);
        }
        snapshot
    }
}

/// Parse `key=value`. The value may be empty; the key may not.
fn parse_annotation(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("annotation key is empty in '{}'", input));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the event for a single-instance emit command
fn build_event(command: EmitCommand) -> Option<LifecycleEvent> {
    match command {
        EmitCommand::Added(args) => Some(LifecycleEvent::InstanceAdded {
            instance: args.snapshot(),
        }),
        EmitCommand::Updated(args) => Some(LifecycleEvent::InstanceUpdated {
            instance: args.snapshot(),
        }),
        EmitCommand::Deleted(args) => Some(LifecycleEvent::InstanceDeleted {
            instance: args.snapshot(),
        }),
        EmitCommand::Stream => None,
    }
}

/// Parse one line of an event stream. Blank lines yield `None`.
fn parse_stream_line(line: &str) -> Result<Option<LifecycleEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

pub async fn handle(command: EmitCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let Some(event) = build_event(command) else {
        return stream(client, format).await;
    };
    client.emit_event(event).await?;
    if format == OutputFormat::Json {
        print_json(&serde_json::json!({ "emitted": 1 }))?;
    }
    Ok(())
}

async fn stream(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    let mut emitted = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let event = parse_stream_line(&line)
            .with_context(|| format!("invalid event on line {}", line_no))?;
        if let Some(event) = event {
            client.emit_event(event).await?;
            emitted += 1;
        }
    }

    match format {
        OutputFormat::Text => println!("Emitted {} event(s)", emitted),
        OutputFormat::Json => print_json(&serde_json::json!({ "emitted": emitted }))?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "emit_tests.rs"]
mod tests;
