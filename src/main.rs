//! layerconf
//!
//! Loads configuration from files, environment variables, and prompts, and
//! prints the merged tree.

use anyhow::Result;
use clap::Parser;
use layerconf::cli::{Cli, Outcome, run};
use layerconf::logging::{self, LogTarget};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let stdin = std::io::stdin();
    let outcome = run(&cli, stdin.lock(), std::io::stdout().lock())?;

    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::NotFound => ExitCode::FAILURE,
    })
}
