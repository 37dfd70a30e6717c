//! FILENAME: app/cli/src/lib.rs
//! PURPOSE: Library half of the `formula` binary, shared with the integration tests.

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Commands};
pub use commands::{execute, load_config, read_config};
