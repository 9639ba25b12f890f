//! Subscriber setup
//!
//! Library code only emits `tracing` events. Binaries and tests that want
//! to see them call [`init_logging`] once.

use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;

/// Base name of the request log
pub const LOG_FILE_NAME: &str = "swhAPI.log";

/// Errors from subscriber installation
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Could not create the log directory or open the file
    #[error("cannot open log file {path}: {source}")]
    Io {
        /// Log file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed
    #[error("logging already initialised: {0}")]
    AlreadyInitialized(String),
}

/// Where and how much to log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Debug-level output instead of info
    pub verbose: bool,
    /// Directory for the log file; stderr when unset
    pub log_dir: Option<PathBuf>,
    /// Prefix the file name with the current date
    pub file_datestamp: bool,
}

impl LogConfig {
    /// Log file for `today`, if a directory is configured
    pub fn log_file_path(&self, today: NaiveDate) -> Option<PathBuf> {
        let dir = self.log_dir.as_ref()?;
        let name = if self.file_datestamp {
            format!("{}-{}", today.format("%Y-%m-%d"), LOG_FILE_NAME)
        } else {
            LOG_FILE_NAME.to_string()
        };
        Some(dir.join(name))
    }

    fn level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// Install a global fmt subscriber
///
/// With a log directory, events are appended to the log file without ANSI
/// colours; otherwise they go to stderr.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let today = chrono::Local::now().date_naive();

    match config.log_file_path(today) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| LoggingError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LoggingError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::fmt()
                .with_max_level(config.level())
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
        }
        None => tracing_subscriber::fmt()
            .with_max_level(config.level())
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string())),
    }
}
