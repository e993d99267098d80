// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manual smoke test: cancel every job on the first discovered printer, then
// poll its incomplete and completed jobs until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use ipp_picture_core::Result;
use ipp_picture_print::AirPrintClient;
use ipp_picture_smoke::{init_tracing, load_config, print_json, wait_for_printer};

#[derive(Parser)]
#[command(name = "job-view", about = "Watch the job queues of an AirPrint printer")]
struct Args {
    /// Seconds between polls.
    #[arg(long, default_value_t = 5)]
    interval: u64,
    /// Seconds to wait for discovery to select a printer.
    #[arg(long, default_value_t = 20)]
    wait: u64,
    /// Skip the initial Cancel-Jobs.
    #[arg(long)]
    keep_jobs: bool,
    /// Client config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "job-view failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let client = AirPrintClient::with_mdns(load_config(args.config.as_deref())?)?;
    client.start_discovery()?;
    wait_for_printer(&client, Duration::from_secs(args.wait)).await?;

    if !args.keep_jobs {
        print_json("cancel all jobs", &client.cancel_jobs(&[]).await?)?;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                print_json("+++ incomplete jobs", &client.get_incomplete_jobs().await?.jobs())?;
                print_json("--- completed jobs", &client.get_completed_jobs().await?.jobs())?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    client.stop_discovery()?;
    Ok(())
}
