// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `podcap status`: the agent's node, uptime, and live captures.

use anyhow::Result;

use crate::client::{AgentStatus, DaemonClient};
use crate::output::{format_age, format_elapsed, print_json, OutputFormat};
use crate::table::{Column, Table};

pub async fn handle(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;
    match format {
        OutputFormat::Text => {
            let mut out = std::io::stdout().lock();
            render(&status, &mut out)?;
        }
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

fn render(status: &AgentStatus, out: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(
        out,
        "podcapd on {} (up {})",
        status.node,
        format_elapsed(status.uptime_secs)
    )?;

    if status.captures.is_empty() {
        writeln!(out, "No active captures")?;
        return Ok(());
    }

    writeln!(out)?;
    let mut table = Table::new(vec![
        Column::left("INSTANCE"),
        Column::right("PID"),
        Column::right("FILES"),
        Column::right("AGE"),
        Column::left("OUTPUT"),
    ]);
    for capture in &status.captures {
        table.row(vec![
            capture.instance.to_string(),
            capture
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            capture.max_files.clone(),
            format_age(capture.started_at_ms),
            capture.output.display().to_string(),
        ]);
    }
    table.render(out)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
