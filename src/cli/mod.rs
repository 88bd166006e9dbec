//! Command-line interface for amplicon-qc.
//!
//! ## Usage
//!
//! ```text
//! # Validate the manifest, run mothur, and deduplicate its log
//! amplicon-qc --config qc.toml
//!
//! # Machine-readable outcome
//! amplicon-qc -c qc.toml --format json
//! ```
//!
//! Exit code is 0 when the whole run succeeded and 1 otherwise.

use std::path::PathBuf;

use clap::Parser;

pub mod run;

#[derive(Parser)]
#[command(name = "amplicon-qc")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Validate a sequencing batch manifest and run mothur QC")]
#[command(
    long_about = "amplicon-qc checks that mothur is installed, validates the batch manifest \
(every sample needs R1/R2 reads and an I1 or I2 index file, with no hyphens in filenames), \
runs the configured mothur commands, explains any crash in terms of the signal that killed \
mothur, and writes a deduplicated copy of the mothur log."
)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, required = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format for the final report
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
