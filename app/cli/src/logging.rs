//! FILENAME: app/cli/src/logging.rs
// PURPOSE: Unified logging for the command-line tool.
// CONTEXT: Every record becomes one `seq|level|category|message` line. The
// category is the record target, so library stages show up as LEX, PARSE
// and EXPAND. Lines go to stderr and, when configured, to a log file.

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Environment variable read when no -v flag is given.
pub const LOG_ENV_VAR: &str = "FORMULA_LOG";

/// Global sequence counter
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Global log file handle
pub static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

/// One-letter level code used in log lines.
pub fn level_code(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "E",
        log::Level::Warn => "W",
        log::Level::Info => "I",
        log::Level::Debug => "D",
        log::Level::Trace => "T",
    }
}

/// Formats a log line in unified format.
pub fn format_line(seq: u64, level: &str, category: &str, message: &str) -> String {
    format!("{}|{}|{}|{}", seq, level, category, message)
}

/// Picks the level filter: -v flags win, then FORMULA_LOG, then warnings only.
pub fn resolve_level(verbose: u8, env_value: Option<&str>) -> LevelFilter {
    match verbose {
        0 => env_value
            .and_then(|value| LevelFilter::from_str(value.trim()).ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Opens (and truncates) the log file.
pub fn init_log_file(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to create log file {}: {}", path.display(), e))?;

    let mut log_file = LOG_FILE
        .lock()
        .map_err(|e| anyhow::anyhow!("log file lock error: {}", e))?;
    *log_file = Some(file);
    Ok(())
}

/// Write a log line in unified format
pub fn write_log(level: &str, category: &str, message: &str) {
    let line = format_line(next_seq(), level, category, message);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("[LOG_ERROR] Failed to write: {}", e);
            }
            let _ = file.flush();
        }
    }

    // stdout carries the JSON result
    eprintln!("{}", line);
}

// ============================================================================
// LOG FACADE ADAPTER
// ============================================================================

/// Routes `log` records into the unified log.
pub struct UnifiedLogger {
    level: LevelFilter,
}

impl UnifiedLogger {
    pub fn new(level: LevelFilter) -> Self {
        UnifiedLogger { level }
    }
}

impl Log for UnifiedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        write_log(
            level_code(record.level()),
            record.target(),
            &record.args().to_string(),
        );
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

/// Installs the unified logger. Call once, before any command runs.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = log_file {
        init_log_file(path)?;
    }

    log::set_boxed_logger(Box::new(UnifiedLogger::new(level)))
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    log::set_max_level(level);

    Ok(())
}
