// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manual smoke test: discover a printer, dump its attributes, print a JPEG,
// then list jobs and query the first incomplete one.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;

use ipp_picture_core::{PrintMeta, Result};
use ipp_picture_print::AirPrintClient;
use ipp_picture_smoke::{init_tracing, load_config, print_json, wait_for_printer};

#[derive(Parser)]
#[command(name = "print-photo", about = "Discover an AirPrint printer and print a JPEG on it")]
struct Args {
    /// JPEG file to print.
    photo: PathBuf,
    /// Suffix for the job name (`<id>-<name>.jpg`).
    #[arg(long, default_value = "TESTER")]
    name: String,
    /// JSON file with `job-attributes-tag` extras.
    #[arg(long)]
    meta: Option<PathBuf>,
    /// Seconds to wait for discovery to select a printer.
    #[arg(long, default_value_t = 20)]
    wait: u64,
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
            error!(error = %e, "print-photo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let client = AirPrintClient::with_mdns(load_config(args.config.as_deref())?)?;
    client.start_discovery()?;
    wait_for_printer(&client, Duration::from_secs(args.wait)).await?;

    print_json("~~~ printer attributes", &client.get_printer_attributes().await?)?;

    let meta: PrintMeta = match &args.meta {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => PrintMeta::default(),
    };
    let photo = std::fs::read(&args.photo)?;
    match client.print_jpeg(&photo, &meta, Some(&args.name)).await {
        Ok(response) => print_json("=== print job", &response)?,
        Err(e) => error!(error = %e, "print job failed"),
    }

    let incomplete = client.get_incomplete_jobs().await?;
    print_json("+++ incomplete jobs", &incomplete.jobs())?;
    let completed = client.get_completed_jobs().await?;
    print_json("--- completed jobs", &completed.jobs())?;

    if let Some(job_uri) = incomplete.jobs().into_iter().find_map(|j| j.job_uri) {
        print_json("... job attributes", &client.get_job_attributes(&job_uri).await?)?;
    }

    client.stop_discovery()?;
    println!("Bye!");
    Ok(())
}
