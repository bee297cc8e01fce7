//! Configuration for the file I/O driver.
//!
//! The knobs at this layer are deliberately few: how deep the reactor's
//! submission queue should be, and what the logger records. Presets cover
//! the common cases; fields are public for anything finer.

use crate::logging::LogLevel;

/// Top-level configuration for [`FileIo`](crate::FileIo).
#[derive(Debug, Clone)]
pub struct FileIoConfig {
    /// Number of submission queue entries requested from the reactor.
    pub queue_depth: u32,
    /// Logging and capture configuration.
    pub logging: LoggingConfig,
}

impl Default for FileIoConfig {
    fn default() -> Self {
        Self {
            queue_depth: 128,
            logging: LoggingConfig::default(),
        }
    }
}

impl FileIoConfig {
    /// Development preset: debug-level logging with in-memory capture.
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                enabled: true,
                level: LogLevel::Debug,
                capture: true,
            },
            ..Self::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether any entries are recorded at all.
    pub enabled: bool,
    /// Minimum level an entry needs to be recorded.
    pub level: LogLevel,
    /// Retain recorded entries in memory (for tests and diagnostics).
    pub capture: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: LogLevel::Info,
            capture: false,
        }
    }
}
