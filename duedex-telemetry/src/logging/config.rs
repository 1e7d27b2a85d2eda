//! Logging configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the logging system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive (e.g. "info", "duedex_gateway=debug").
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Output targets
    #[serde(default = "default_outputs")]
    pub outputs: Vec<LogOutput>,

    /// Include thread IDs in log output
    #[serde(default)]
    pub include_thread_id: bool,

    /// Include file and line information
    #[serde(default)]
    pub include_file_info: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            outputs: default_outputs(),
            include_thread_id: false,
            include_file_info: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_outputs() -> Vec<LogOutput> {
    vec![LogOutput::Stdout]
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines for log aggregation
    #[default]
    Json,
    /// Human-readable format for development
    Pretty,
}

/// Log output target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a rolling file
    File {
        /// Directory for log files
        path: String,
        /// File name prefix
        #[serde(default = "default_file_prefix")]
        prefix: String,
        /// Rotation policy
        #[serde(default)]
        rotation: Option<RotationConfig>,
    },
}

fn default_file_prefix() -> String {
    "duedex.log".to_string()
}

/// Log rotation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationConfig {
    /// Rotate logs hourly
    Hourly,
    /// Rotate logs daily
    Daily,
    /// Never rotate (single file)
    Never,
}
