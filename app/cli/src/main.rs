//! FILENAME: app/cli/src/main.rs
//! PURPOSE: Entry point of the `formula` command-line tool.

use clap::Parser;
use formula_cli::{execute, logging, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_level = std::env::var(logging::LOG_ENV_VAR).ok();
    let level = logging::resolve_level(cli.verbose, env_level.as_deref());
    if let Err(e) = logging::init(level, cli.log_file.as_deref()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match execute(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!(target: "CLI", "command failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
