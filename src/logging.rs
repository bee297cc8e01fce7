//! Structured logging for operation lifecycles.
//!
//! The driver records operation starts, stage transitions, and terminal
//! outcomes as structured entries carrying the request token and file
//! descriptor involved. Entries are printed to the console and, when capture
//! is enabled, retained in memory so tests can assert on what a scenario
//! logged.

use std::fmt;
use std::os::unix::io::RawFd;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;

/// Log level for driver and operation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Trace-level logging (very verbose)
    Trace = 0,
    /// Debug-level logging
    Debug = 1,
    /// Info-level logging
    Info = 2,
    /// Warning-level logging
    Warn = 3,
    /// Error-level logging
    Error = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One structured entry about an operation or driver event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Timestamp when the entry was created.
    pub timestamp: SystemTime,
    /// Severity of the entry.
    pub level: LogLevel,
    /// Component that produced the entry (`"driver"`, `"read"`, ...).
    pub component: &'static str,
    /// Native request token, when the event concerns one.
    pub token: Option<u64>,
    /// File descriptor, when the event concerns an open file.
    pub fd: Option<RawFd>,
    /// Human-readable message.
    pub message: String,
}

impl LogEntry {
    /// Create a new entry.
    pub fn new(level: LogLevel, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            component,
            token: None,
            fd: None,
            message: message.into(),
        }
    }

    /// Attach the native request token this entry concerns.
    pub fn with_token(mut self, token: u64) -> Self {
        self.token = Some(token);
        self
    }

    /// Attach the file descriptor this entry concerns.
    pub fn with_fd(mut self, fd: RawFd) -> Self {
        self.fd = Some(fd);
        self
    }

    /// Format the entry as a single console line.
    pub fn format(&self) -> String {
        let timestamp = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let mut parts = vec![
            format!("[{timestamp}]"),
            self.level.to_string(),
            self.component.to_string(),
        ];
        if let Some(token) = self.token {
            parts.push(format!("op:{token}"));
        }
        if let Some(fd) = self.fd {
            parts.push(format!("fd:{fd}"));
        }
        parts.push(self.message.clone());
        parts.join(" ")
    }
}

/// Level-filtered sink for structured entries.
#[derive(Debug)]
pub struct Logger {
    config: LoggingConfig,
    captured: Vec<LogEntry>,
}

impl Logger {
    /// Create a logger with the given configuration.
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            captured: Vec::new(),
        }
    }

    /// Whether entries at `level` would be recorded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.config.enabled && level >= self.config.level
    }

    /// Record one entry, printing it and capturing it per configuration.
    pub fn log(&mut self, entry: LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        if entry.level >= LogLevel::Warn {
            eprintln!("{}", entry.format());
        } else {
            println!("{}", entry.format());
        }
        if self.config.capture {
            self.captured.push(entry);
        }
    }

    /// Entries retained by capture mode, oldest first.
    pub fn captured(&self) -> &[LogEntry] {
        &self.captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_config(level: LogLevel) -> LoggingConfig {
        LoggingConfig {
            enabled: true,
            level,
            capture: true,
        }
    }

    #[test]
    fn disabled_logger_records_nothing() {
        let mut logger = Logger::new(LoggingConfig::default());
        logger.log(LogEntry::new(LogLevel::Error, "driver", "dropped"));
        assert!(logger.captured().is_empty());
    }

    #[test]
    fn level_filter_applies() {
        let mut logger = Logger::new(capture_config(LogLevel::Warn));
        logger.log(LogEntry::new(LogLevel::Debug, "read", "filtered"));
        logger.log(LogEntry::new(LogLevel::Error, "read", "kept"));
        assert_eq!(logger.captured().len(), 1);
        assert_eq!(logger.captured()[0].message, "kept");
    }

    #[test]
    fn format_includes_token_and_fd() {
        let line = LogEntry::new(LogLevel::Info, "write", "opened")
            .with_token(42)
            .with_fd(7)
            .format();
        assert!(line.contains("op:42"));
        assert!(line.contains("fd:7"));
        assert!(line.contains("write"));
        assert!(line.contains("opened"));
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
