//! File logging bootstrap.
//!
//! The terminal belongs to the UI while the atlas runs, so diagnostics go to
//! rotating files in the log directory instead of stderr.
//!
//! # Invariants
//! - Initialization is idempotent for the same directory and level.
//! - Re-initialization with a different directory or level is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

use crate::error::{AtlasError, Result};

const LOG_FILE_BASENAME: &str = "community-atlas";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Starts file logging at `level` under `log_dir`.
///
/// # Errors
/// - Unsupported level names.
/// - A log directory that cannot be created.
/// - A second call with a different directory or level.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState> {
        std::fs::create_dir_all(log_dir).map_err(|e| AtlasError::io(log_dir, e))?;

        let logger = Logger::try_with_str(level)
            .map_err(|err| AtlasError::Logging(format!("invalid log level `{level}`: {err}")))?
            .log_to_file(FileSpec::default().directory(log_dir).basename(LOG_FILE_BASENAME))
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| AtlasError::Logging(format!("failed to start logger: {err}")))?;

        info!(
            "event=app_start status=ok version={} level={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            level,
            log_dir.display()
        );

        Ok(LoggingState { level, log_dir: log_dir.to_path_buf(), _logger: logger })
    })?;

    if state.log_dir != log_dir {
        return Err(AtlasError::Logging(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_dir.display(),
            log_dir.display()
        )));
    }
    if state.level != level {
        return Err(AtlasError::Logging(format!(
            "logging already initialized with level `{}`; refusing to switch to `{level}`",
            state.level
        )));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(AtlasError::Logging(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_normalized() {
        assert_eq!(normalize_level(" Warning ").unwrap(), "warn");
        assert_eq!(normalize_level("DEBUG").unwrap(), "debug");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn init_is_idempotent_and_rejects_a_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        init_logging("info", dir.path()).unwrap();
        init_logging("INFO", dir.path()).unwrap();

        let other = tempfile::tempdir().unwrap();
        assert!(matches!(init_logging("info", other.path()), Err(AtlasError::Logging(_))));
        assert!(matches!(init_logging("debug", dir.path()), Err(AtlasError::Logging(_))));
    }
}
