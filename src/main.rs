//! Garble CLI - Speech Degradation Batch Tool

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use garble::cli::commands::run_batch;
use garble::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Garble v{}", env!("CARGO_PKG_VERSION"));

    let options = cli.batch_options().context("failed to load configuration")?;
    let report = run_batch(&options).map_err(|e| {
        for suggestion in e.recovery_suggestions() {
            error!("  - {}", suggestion);
        }
        e
    })?;

    println!(
        "Processed {} file(s), {} failed, {} output(s) (seed {})",
        report.processed, report.failed, report.outputs, report.seed
    );
    if report.background_mix_disabled {
        println!("Background mixing was disabled: no usable noise clips");
    }

    Ok(())
}
