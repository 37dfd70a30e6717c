//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for the formula CLI integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

/// Output of one CLI invocation.
pub struct CliOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Parses stdout as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim()).expect("stdout should be JSON")
    }
}

/// Test harness that runs the `formula` binary with optional fixtures.
pub struct CliHarness {
    config: Option<NamedTempFile>,
    dir: TempDir,
}

impl CliHarness {
    /// Create a harness without a config file.
    pub fn new() -> Self {
        CliHarness {
            config: None,
            dir: TempDir::new().expect("temp dir"),
        }
    }

    /// Create a harness with a JSON config file passed through --config.
    pub fn with_config(json: &str) -> Self {
        let mut file = NamedTempFile::new().expect("temp config");
        file.write_all(json.as_bytes()).expect("write config");
        CliHarness {
            config: Some(file),
            dir: TempDir::new().expect("temp dir"),
        }
    }

    /// Path for a scratch file inside the harness directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Runs the binary with `args`, after the --config flag when one is set.
    pub fn run(&self, args: &[&str]) -> CliOutput {
        let mut command = Command::new(env!("CARGO_BIN_EXE_formula"));
        command.env_remove("FORMULA_LOG");
        if let Some(config) = &self.config {
            command.arg("--config").arg(config.path());
        }
        command.args(args);

        let output = command.output().expect("failed to run formula binary");
        CliOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn lex(&self, formula: &str) -> CliOutput {
        self.run(&["lex", formula])
    }

    pub fn parse(&self, formula: &str) -> CliOutput {
        self.run(&["parse", formula])
    }
}
