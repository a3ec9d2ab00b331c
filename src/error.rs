//! Error types for pantilt
//!
//! The motion core itself never fails: out-of-range angles saturate and a
//! cancelled move reports `false`. These types cover the edges around it.

use thiserror::Error;

/// Main error type for pantilt
#[derive(Error, Debug)]
pub enum PantiltError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Observation error: {0}")]
    Observation(#[from] ObservationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors parsing a recorded detector observation
#[derive(Error, Debug, PartialEq)]
pub enum ObservationError {
    #[error("line {line}: expected 'none', 'x y' or 'x y w h', got {fields} fields")]
    FieldCount { line: usize, fields: usize },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: coordinate '{value}' is not finite")]
    NonFinite { line: usize, value: String },
}

/// Result type alias for pantilt operations
pub type Result<T> = std::result::Result<T, PantiltError>;
