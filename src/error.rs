//! Error types for the fallible edges of the engine.
//!
//! Per-frame processing never fails; only configuration loading and timeline
//! export can.

/// Errors from configuration and export.
#[derive(thiserror::Error, Debug)]
pub enum SwingError {
    /// File I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Timeline could not be serialized
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A configuration value is unusable even after clamping
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SwingError>;
