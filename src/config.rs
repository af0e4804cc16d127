//! Configuration file support
//!
//! Optional defaults loaded from `~/.batchtail/config.toml`. Command-line
//! flags always take precedence; a missing or unreadable file falls back to
//! the built-in defaults.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Region used when neither the CLI nor the config file names one.
pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Directory for generated log files when the config names none.
const DEFAULT_OUTPUT_DIR: &str = "logs";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Default AWS region.
    pub region: Option<String>,

    /// Default CloudWatch log group (overrides stream-name inference).
    pub log_group: Option<String>,

    /// Directory for generated log files.
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".batchtail").join("config.toml"))
    }

    /// Load the config file from disk, falling back to defaults on any
    /// failure.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}
