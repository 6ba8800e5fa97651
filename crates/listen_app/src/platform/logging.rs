//! Log setup for the terminal client.
//!
//! File output goes to `./listen_client.log` in the current working directory.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./listen_client.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    File,
    /// Warnings and errors on stderr, the rest on stdout.
    Terminal,
    Both,
}

impl LogDestination {
    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }
}

pub fn initialize(destination: LogDestination) {
    let loggers = loggers_for(destination, Path::new(LOG_FILE), LevelFilter::Info);
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Builds one logger per destination. An unwritable log file is reported on
/// stderr and skipped.
fn loggers_for(
    destination: LogDestination,
    log_path: &Path,
    level: LevelFilter,
) -> Vec<Box<dyn SharedLogger>> {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination.to_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        match File::create(log_path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => eprintln!(
                "Warning: logging to {} disabled: {err}",
                log_path.display()
            ),
        }
    }
    loggers
}

/// RFC3339 timestamps, no module targets, and no frame-level socket chatter.
fn logger_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("tungstenite")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_pick_their_loggers() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("listen_client_test_{}.log", std::process::id()));

        assert_eq!(
            loggers_for(LogDestination::Terminal, &path, LevelFilter::Info).len(),
            1
        );
        assert!(!path.exists());
        assert_eq!(
            loggers_for(LogDestination::Both, &path, LevelFilter::Info).len(),
            2
        );
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_log_file_is_skipped() {
        let path = Path::new("/nonexistent-dir/listen_client.log");
        assert!(loggers_for(LogDestination::File, path, LevelFilter::Info).is_empty());
    }
}
