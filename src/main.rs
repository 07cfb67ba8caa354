//! # covid-pipeline command line
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging under <project-dir>/logs
//!   └─> Execute the command (run / list / validate)
//! ```
//!
//! ```bash
//! covid-pipeline run
//! covid-pipeline run --pipeline eda --project-dir /srv/covid --env local
//! covid-pipeline list
//! covid-pipeline validate
//! ```
//!
//! Any failure is logged and ends the process with a non-zero exit code.

#![expect(clippy::print_stdout)] // command output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use covid_pipeline::logging;

/// # Errors
///
/// Returns error if logging cannot be set up or the command fails.
fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let paths = cli.command.project().paths();
    logging::init(&paths.log_dir())?;

    cli::run_command(cli.command).inspect_err(|e| {
        tracing::error!("{e:#}");
    })
}
