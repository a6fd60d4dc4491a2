//! Error reporting for failed queries
//!
//! Every driver-level failure is turned into a [`QueryErrorEvent`] and handed
//! to a [`QueryErrorSink`]. The default sink, [`ErrorLogger`], writes through
//! the `log` facade and can additionally append JSON lines to a file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;

/// Log levels for error logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Output targets for logging
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput {
    Console,
    File(String),
    Both(String),
    None,
}

/// Configuration for error logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub output: LogOutput,
    /// Include bound parameter values in log entries
    pub include_params: bool,
    pub max_file_size: Option<u64>,
    pub max_files: Option<u32>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Error,
            output: LogOutput::Console,
            include_params: cfg!(debug_assertions),
            max_file_size: Some(10 * 1024 * 1024), // 10MB
            max_files: Some(5),
        }
    }
}

impl LogConfig {
    /// Build a log configuration from `FLUENTDB_LOG_*` environment variables
    pub fn from_env() -> Self {
        let mut config = LogConfig::default();

        if let Ok(level_str) = std::env::var("FLUENTDB_LOG_LEVEL") {
            config.level = LogLevel::from_str(&level_str);
        }

        if let Ok(output_str) = std::env::var("FLUENTDB_LOG_OUTPUT") {
            config.output = LogOutput::parse(&output_str);
        }

        if let Ok(params) = std::env::var("FLUENTDB_LOG_PARAMS") {
            config.include_params = params == "true" || params == "1";
        }

        config
    }
}

impl LogOutput {
    /// Parse `console`, `none`, `file:<path>` or `both:<path>`
    pub fn parse(s: &str) -> Self {
        if let Some(path) = s.strip_prefix("file:") {
            return LogOutput::File(path.to_string());
        }
        if let Some(path) = s.strip_prefix("both:") {
            return LogOutput::Both(path.to_string());
        }
        match s {
            "none" => LogOutput::None,
            _ => LogOutput::Console,
        }
    }
}

/// A failed query, as seen by the error sink
#[derive(Debug, Clone, Serialize)]
pub struct QueryErrorEvent {
    pub timestamp: String,
    pub error_code: String,
    pub sql: String,
    pub message: String,
    pub params: Vec<String>,
}

impl QueryErrorEvent {
    pub fn new(error: &Error, sql: &str, params: Vec<String>) -> Self {
        let message = match error {
            Error::Query { message, .. } => message.clone(),
            other => other.to_string(),
        };

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            error_code: error.error_code().to_string(),
            sql: sql.to_string(),
            message,
            params,
        }
    }
}

/// Receiver for failed-query events
///
/// Sinks observe failures only. The error is still returned to the caller
/// whatever the sink does.
pub trait QueryErrorSink: Send + Sync {
    fn report(&self, event: &QueryErrorEvent);
}

/// Structured log entry
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub error_code: String,
    pub sql: String,
    pub additional_data: HashMap<String, serde_json::Value>,
}

/// Error logger with configurable output and formatting
pub struct ErrorLogger {
    config: LogConfig,
}

impl Default for ErrorLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl ErrorLogger {
    /// Create a new error logger
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    /// Create logger from environment variables
    pub fn from_env() -> Self {
        Self::new(LogConfig::from_env())
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn create_log_entry(&self, event: &QueryErrorEvent) -> LogEntry {
        let mut additional_data = HashMap::new();
        if self.config.include_params && !event.params.is_empty() {
            additional_data.insert("params".to_string(), serde_json::json!(event.params));
        }

        LogEntry {
            timestamp: event.timestamp.clone(),
            level: LogLevel::Error.as_str().to_string(),
            message: sanitize_message(&event.message),
            error_code: event.error_code.clone(),
            sql: event.sql.clone(),
            additional_data,
        }
    }

    /// Write log entry to configured output
    fn write_log_entry(&self, entry: &LogEntry) {
        match &self.config.output {
            LogOutput::Console => self.write_to_console(entry),
            LogOutput::File(path) => {
                if let Err(e) = self.write_to_file(entry, path) {
                    log::warn!("Failed to write to log file {}: {}", path, e);
                    self.write_to_console(entry); // Fallback to console
                }
            }
            LogOutput::Both(path) => {
                self.write_to_console(entry);
                if let Err(e) = self.write_to_file(entry, path) {
                    log::warn!("Failed to write to log file {}: {}", path, e);
                }
            }
            LogOutput::None => {}
        }
    }

    fn write_to_console(&self, entry: &LogEntry) {
        if entry.additional_data.is_empty() {
            log::error!("[{}] {} [SQL: {}]", entry.error_code, entry.message, entry.sql);
        } else {
            log::error!(
                "[{}] {} [SQL: {}] {}",
                entry.error_code,
                entry.message,
                entry.sql,
                serde_json::Value::Object(
                    entry
                        .additional_data
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                )
            );
        }
    }

    /// Append the entry as one JSON line
    fn write_to_file(&self, entry: &LogEntry, file_path: &str) -> Result<()> {
        if let Some(max_size) = self.config.max_file_size {
            if let Ok(metadata) = std::fs::metadata(file_path) {
                if metadata.len() > max_size {
                    self.rotate_log_file(file_path)?;
                }
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let json_line = serde_json::to_string(entry)?;
        writeln!(file, "{}", json_line)?;

        Ok(())
    }

    /// Rotate log files when they exceed max size
    fn rotate_log_file(&self, file_path: &str) -> Result<()> {
        let max_files = self.config.max_files.unwrap_or(5);

        for i in (1..max_files).rev() {
            let old_file = format!("{}.{}", file_path, i);
            let new_file = format!("{}.{}", file_path, i + 1);

            if std::fs::metadata(&old_file).is_ok() {
                std::fs::rename(&old_file, &new_file)?;
            }
        }

        if std::fs::metadata(file_path).is_ok() {
            std::fs::rename(file_path, format!("{}.1", file_path))?;
        }

        Ok(())
    }
}

impl QueryErrorSink for ErrorLogger {
    fn report(&self, event: &QueryErrorEvent) {
        if LogLevel::Error < self.config.level {
            return;
        }
        let entry = self.create_log_entry(event);
        self.write_log_entry(&entry);
    }
}

/// Redact credentials that drivers sometimes echo back in messages
fn sanitize_message(message: &str) -> String {
    let patterns = [
        r"(password=)[^\s;&]+",
        r"(pwd=)[^\s;&]+",
        r"(://[^:/\s]+:)[^@\s]+(@)",
    ];

    let mut sanitized = message.to_string();
    for pattern in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            sanitized = re.replace_all(&sanitized, "${1}[REDACTED]${2}").to_string();
        }
    }
    sanitized
}
