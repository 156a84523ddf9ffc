//! Error types for the core library

use thiserror::Error;

/// Errors raised while loading or validating an [`EditorConfig`](crate::EditorConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML text did not parse
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Result type alias
pub type Result<T> = core::result::Result<T, ConfigError>;
