//! FILENAME: app/cli/src/commands.rs
//! PURPOSE: Runs one parsed command line and renders its JSON output.

use crate::cli::{Cli, Commands};
use anyhow::Result;
use formula_engine::{lex_formula, parse_with_config, ExpansionConfig};
use std::fs;
use std::path::Path;

/// Reads a JSON expansion config. Missing fields keep their defaults.
pub fn read_config(path: &Path) -> Result<ExpansionConfig> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
    ExpansionConfig::from_json(&text)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))
}

/// Builds the effective config: file (or defaults), then command-line overrides.
pub fn load_config(cli: &Cli) -> Result<ExpansionConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ExpansionConfig::default(),
    };
    if let Some(limit) = cli.max_operands {
        config.max_interaction_operands = Some(limit);
    }
    Ok(config)
}

/// Executes the command and returns the text to print on stdout.
pub fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Lex { formula } => {
            log::info!(target: "CLI", "lex {:?}", formula);
            let tokens = lex_formula(formula)?;
            Ok(tokens.to_string())
        }
        Commands::Parse { formula, pretty } => {
            log::info!(target: "CLI", "parse {:?}", formula);
            let config = load_config(cli)?;
            let description = parse_with_config(formula, &config)?;
            let json = if *pretty {
                description.to_json_pretty()?
            } else {
                description.to_json()?
            };
            Ok(json)
        }
    }
}
