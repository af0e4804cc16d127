//! Shared types for batchtail
//!
//! This crate contains data structures used across multiple batchtail crates.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A single log event emitted by a job process.
///
/// Mirrors the `events[]` objects returned by `aws logs get-log-events`;
/// fields we do not use (e.g. `ingestionTime`) are ignored during
/// deserialization.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Raw message text. May carry an in-band severity marker
    /// (e.g. `" - ERROR - "`) or a multi-line traceback collapsed into
    /// one record.
    pub message: String,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// Where a Batch job writes its logs, resolved from the job id.
#[derive(Clone, Debug)]
pub struct JobLogLocation {
    /// CloudWatch log stream name.
    pub log_stream: String,

    /// Job status at resolution time (e.g. `RUNNING`, `SUCCEEDED`).
    pub status: String,
}

/// Log severity level optionally embedded in free-text log lines.
///
/// Ordering follows severity: `Debug < Info < Warning < Error < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// All levels from most to least severe, the search order used by
    /// [`LogLevel::detect`].
    pub const DESCENDING: [LogLevel; 5] = [
        LogLevel::Critical,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Best-effort detection of a severity token in a formatted log line.
    ///
    /// Searches for the literal form `" - <LEVEL> "` (which also covers
    /// `" - <LEVEL> - "`) from CRITICAL down to DEBUG; the first match wins
    /// when a message carries more than one level-like token. Returns `None`
    /// when no token is present — this is a heuristic over free-text lines,
    /// not a parser.
    pub fn detect(message: &str) -> Option<LogLevel> {
        for level in Self::DESCENDING {
            if message.contains(&format!(" - {} ", level.as_str())) {
                return Some(level);
            }
        }
        None
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(format!(
                "unknown log level '{s}' (expected DEBUG, INFO, WARNING, ERROR, or CRITICAL)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_detect_level() {
        let msg = "2024-01-01 10:00:00 - ERROR - validation failed";
        assert_eq!(LogLevel::detect(msg), Some(LogLevel::Error));

        let msg = "2024-01-01 10:00:00 - INFO - job started";
        assert_eq!(LogLevel::detect(msg), Some(LogLevel::Info));
    }

    #[test]
    fn test_detect_prefers_most_severe() {
        // Both tokens present; CRITICAL is checked first.
        let msg = "x - CRITICAL - retrying after - ERROR - downstream";
        assert_eq!(LogLevel::detect(msg), Some(LogLevel::Critical));
    }

    #[test]
    fn test_detect_requires_marker_format() {
        assert_eq!(LogLevel::detect("plain text with no marker"), None);
        // Bare token without the surrounding " - " marker is not detected.
        assert_eq!(LogLevel::detect("ERROR: something broke"), None);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("CRITICAL".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for level in LogLevel::DESCENDING {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }
}
