// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared plumbing for the manual smoke drivers: logging, config loading and
// waiting for discovery to find a printer.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use ipp_picture_core::{AirPrintError, ClientConfig, Result};
use ipp_picture_print::AirPrintClient;

/// Install the `tracing` subscriber, honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Config from `path` when given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path),
        None => Ok(ClientConfig::default()),
    }
}

/// Poll once a second until a printer is selected or `timeout` elapses.
pub async fn wait_for_printer(client: &AirPrintClient, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    while !client.selected() {
        if tokio::time::Instant::now() >= deadline {
            return Err(AirPrintError::Discovery(format!(
                "no printer selected after {}s",
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    if let Some(record) = client.details() {
        info!(name = %record.name, url = ?record.url, "using printer");
    }
    Ok(())
}

/// Pretty-print any serializable value to stdout under a banner.
pub fn print_json<T: Serialize>(banner: &str, value: &T) -> Result<()> {
    println!("{banner}");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
