// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent control: `podcap ping` and `podcap shutdown`

use std::time::Duration;

use anyhow::Result;

use crate::client::DaemonClient;
use crate::env;
use crate::output::{print_json, OutputFormat};

#[derive(clap::Args)]
pub struct ShutdownArgs {
    /// Block until every capture is stopped and the agent has exited
    #[arg(long)]
    pub wait: bool,
}

pub async fn ping(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    client.ping().await?;
    let version = client.hello().await?;
    match format {
        OutputFormat::Text => println!("pong (podcapd {})", version),
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "ok": true, "version": version }))?
        }
    }
    Ok(())
}

pub async fn shutdown(args: ShutdownArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    client.shutdown().await?;

    if args.wait {
        // The socket is removed only after all captures are cleaned up
        let poll = env::wait_poll_ms().unwrap_or(Duration::from_millis(50));
        while client.socket_path().exists() {
            tokio::time::sleep(poll).await;
        }
    }

    match format {
        OutputFormat::Text => {
            if args.wait {
                println!("podcapd stopped");
            } else {
                println!("podcapd shutting down");
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true, "waited": args.wait }))?,
    }
    Ok(())
}
