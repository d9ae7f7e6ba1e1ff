//! Error types
//!
//! Only startup can fail. The log engine itself degrades instead of erroring.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Agent id must not be empty")]
    EmptyAgentId,
    #[error("Agent '{0}' is configured more than once")]
    DuplicateAgent(String),
    #[error("{key} = {secs} is out of range for a duration")]
    InvalidDuration { key: &'static str, secs: i64 },
}
