//! sgf-ingest - SGF game record loader
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use sgf_ingest::config::{CliArgs, IngestConfig};
use sgf_ingest::progress::{print_header, print_summary, ProgressReporter};
use sgf_ingest::walker::Ingestor;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = IngestConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.sgf_dir,
            config.worker_count,
            &config.db_path,
            &config.network,
        );
    }

    info!(dir = %config.sgf_dir.display(), "Going to look for SGF files in");

    let ingestor = Ingestor::new(config.clone());

    // Ctrl-C stops the pipeline at its next blocking point
    let cancel = ingestor.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    let result = if config.show_progress {
        let progress = ProgressReporter::new();
        let reporter = progress.clone();
        let result = ingestor.run_with_progress(move |p| reporter.update(&p));

        match &result {
            Ok(_) => progress.finish("Ingestion completed"),
            Err(_) => progress.finish_and_clear(),
        }
        result
    } else {
        ingestor.run()
    };

    let summary = result.context("Ingestion failed")?;

    if config.show_progress {
        print_summary(&summary, &config.db_path);
    }

    if summary.persist.records_skipped > 0 {
        info!(
            skipped = summary.persist.records_skipped,
            "Ingestion completed with skipped records"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("sgf_ingest=debug,warn")
    } else {
        EnvFilter::new("sgf_ingest=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
