use std::process::ExitCode;

use clap::Parser;

use amplicon_qc::cli;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli::run::run(cli)
}
