//! Entry point behind the CLI: load config, set up logging, run the pipeline,
//! and report.

use std::process::ExitCode;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::core::config::PipelineConfig;
use crate::core::types::RunOutcome;
use crate::logging;
use crate::pipeline::Pipeline;
use crate::tool::ToolLocator;

/// Execute a full run and map the outcome to a process exit code.
///
/// Failures before logging is available (bad config, unwritable output
/// directory) are printed to stderr and exit 1. The output directory and run
/// log are only created once the tool has been found.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(cli: Cli) -> ExitCode {
    match try_run(&cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn try_run(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let config = PipelineConfig::load(&cli.config)?;

    // A missing tool aborts before any file I/O; the pipeline still reports it
    if ToolLocator::default().find(&config.tool.executable).is_some() {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Cannot create output directory {}",
                config.output_dir.display()
            )
        })?;
        logging::init(&config.run_log_path(), cli.verbose)?;
    } else {
        logging::init_stderr(cli.verbose)?;
    }
    tracing::info!("Using config {}", cli.config.display());

    let outcome = Pipeline::new(&config).run();
    print_outcome(&outcome, cli.format)?;
    Ok(outcome)
}

fn print_outcome(outcome: &RunOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            match &outcome.diagnostic {
                Some(cause) => println!("Run {}: {cause}", outcome.status),
                None => println!("Run {}", outcome.status),
            }
            for v in &outcome.violations {
                println!("  {v}");
            }
            if let Some(path) = &outcome.dedup_log {
                println!("Deduplicated log: {}", path.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
    }
    Ok(())
}
