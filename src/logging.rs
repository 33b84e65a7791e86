// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Logging setup (ambient component A2): a `fern`-based dispatcher with
//! one branch to the console and one to a file, each at its own
//! severity, per spec.md §6's `logSeverityConsole`/`logSeverityFile`
//! configuration fields. Generalized from the teacher's single-
//! destination `setup_logging` (`srclist/src/bin/srclist.rs`) into a
//! two-destination form.

use std::path::Path;

use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unrecognised log severity {0:?}; expected one of off/error/warn/info/debug/trace")]
    UnknownSeverity(String),
    #[error("failed to initialise logging: {0}")]
    Init(#[from] fern::InitError),
}

/// Parse one of spec.md §6's severity strings into a [`LevelFilter`].
/// Case-insensitive, matching a typical XML/TOML configuration field.
pub fn parse_severity(s: &str) -> Result<LevelFilter, LoggingError> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(LoggingError::UnknownSeverity(s.to_string())),
    }
}

/// Install a [`fern::Dispatch`] with one branch to stdout at
/// `console_severity` and one to `log_path` at `file_severity`, per
/// spec.md §6. Safe to call once per process; a second call returns an
/// `Err` from the underlying `log` crate, which callers should treat as
/// fatal (configuration).
pub fn init_logging(
    console_severity: LevelFilter,
    file_severity: LevelFilter,
    log_path: &Path,
) -> Result<(), LoggingError> {
    let max_severity = console_severity.max(file_severity);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(console_severity)
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(file_severity)
        .chain(fern::log_file(log_path)?);

    fern::Dispatch::new()
        .level(max_severity)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|_| LoggingError::UnknownSeverity("logger already initialised".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_severity_accepts_known_levels() {
        assert_eq!(parse_severity("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_severity("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_severity("Off").unwrap(), LevelFilter::Off);
    }

    #[test]
    fn parse_severity_rejects_unknown() {
        assert!(parse_severity("verbose").is_err());
    }
}
