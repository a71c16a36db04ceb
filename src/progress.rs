//! Progress reporting for the ingestion run
//!
//! Spinner fed from [`IngestProgress`] snapshots, plus the header and
//! summary printed around a run.

use crate::walker::{IngestProgress, IngestSummary};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress reporter that displays ingestion status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &IngestProgress) {
        let msg = format!(
            "Files: {} | Games: {} | Players: {} | Skipped: {} | Rate: {:.0} games/s",
            format_number(progress.files_found),
            format_number(progress.games_written),
            format_number(progress.players_inserted),
            format_number(progress.records_skipped),
            progress.games_per_second(),
        );

        self.bar.set_message(msg);
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the ingestion results
pub fn print_summary(summary: &IngestSummary, db_path: &Path) {
    let duration_secs = summary.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        summary.pool.files_processed as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Ingestion Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} ({} read)",
        style("Files:").bold(),
        format_number(summary.pool.files_processed),
        format_size(summary.pool.bytes_read, BINARY)
    );
    println!(
        "  {} {}",
        style("Game trees:").bold(),
        format_number(summary.pool.records_sent)
    );
    println!(
        "  {} {}",
        style("Games written:").bold(),
        format_number(summary.persist.games_written)
    );
    println!(
        "  {} {} new, {} already stored",
        style("Players:").bold(),
        format_number(summary.persist.players_inserted),
        format_number(summary.persist.players_reused)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if summary.persist.records_skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(summary.persist.records_skipped)
        );
    }

    match (summary.players_in_db, summary.games_in_db) {
        (Some(players), Some(games)) => println!(
            "  {} {} ({} players, {} games)",
            style("Database:").bold(),
            db_path.display(),
            format_number(players),
            format_number(games)
        ),
        _ => println!("  {} {}", style("Database:").bold(), db_path.display()),
    }
    println!();
}

/// Print a header at the start of the run
pub fn print_header(source: &Path, workers: usize, db_path: &Path, network: &str) {
    println!();
    println!(
        "{} {}",
        style("sgf-ingest").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source.display());
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Network:").bold(), network);
    println!("  {} {}", style("Database:").bold(), db_path.display());
    println!();
}
