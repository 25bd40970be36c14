//! # Supply-Chain Client
//!
//! Interactive client for the supply-chain ledger. Mirrors the ledger's
//! records every sync interval and submits create / pay / deliver commands
//! typed on stdin.
//!
//! ## Shutdown Sequence
//!
//! 1. `quit`, end of input or Ctrl+C stops the command loop
//! 2. The session is closed and the sync timer released
//! 3. Pending command tasks are left to finish or be dropped with the runtime

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Instrument};

use client_runtime::{parse_command, CliArgs, ClientConfig, ClientRuntime, Reply};
use sc_ledger_sync::ViewEvent;
use sc_telemetry::{init_telemetry, subsystem_span};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ClientConfig::load(&args).context("Failed to load configuration")?;

    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    let runtime = Arc::new(ClientRuntime::new(&config));
    runtime.start();

    let render = tokio::spawn(render_events(runtime.subscribe()));

    println!("Type \"help\" for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if command.is_dispatch() {
            // Keep reading while the ledger answers
            let runtime = Arc::clone(&runtime);
            let span = subsystem_span!("dispatch", command = ?command);
            tokio::spawn(
                async move {
                    if let Reply::Text(text) = runtime.execute(command).await {
                        println!("{}", text);
                    }
                }
                .instrument(span),
            );
            continue;
        }

        match runtime.execute(command).await {
            Reply::Text(text) => println!("{}", text),
            Reply::Quit => break,
        }
    }

    runtime.shutdown().await;
    render.abort();
    info!("Supply-chain client stopped");
    Ok(())
}

/// Print errors pushed by the session as they happen.
async fn render_events(mut events: tokio::sync::broadcast::Receiver<ViewEvent>) {
    let mut last_len = None;
    loop {
        match events.recv().await {
            Ok(ViewEvent::Snapshot(snapshot)) => {
                if last_len != Some(snapshot.len()) {
                    println!("ledger now holds {} records", snapshot.len());
                    last_len = Some(snapshot.len());
                }
            }
            Ok(ViewEvent::InFlight(_)) => {}
            Ok(ViewEvent::Error(error)) => eprintln!("! {}", error),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "View events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
