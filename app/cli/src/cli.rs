//! FILENAME: app/cli/src/cli.rs
//! PURPOSE: Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "formula")]
#[command(about = "Lex and parse statistical model formulas into JSON", long_about = None)]
pub struct Cli {
    /// Path to a JSON expansion config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Largest operand count allowed in one '*' group (overrides the config file)
    #[arg(long, global = true)]
    pub max_operands: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write log lines to this file as well as stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the token stream of a formula
    Lex {
        /// Formula text, e.g. "y ~ x1*x2"
        formula: String,
    },

    /// Print the resolved model description of a formula
    Parse {
        /// Formula text, e.g. "y ~ x1*x2 + (1|g)"
        formula: String,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}
