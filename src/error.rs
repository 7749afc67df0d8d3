//! Unified error hierarchy for rideclass
//!
//! Provides a structured error type system for ride analysis, with
//! severity levels that `logging::log_ride_error` maps onto tracing events.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all rideclass operations
#[derive(Debug, Error)]
pub enum RideError {
    /// Malformed telemetry streams
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Ride-level input that cannot be analyzed
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ride record (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stream shape errors, raised before any segmentation runs
#[derive(Debug, Error)]
pub enum StreamError {
    /// A stream contains no samples
    #[error("Empty stream: {stream}")]
    Empty { stream: String },

    /// Two aligned streams differ in length
    #[error("Stream length mismatch: {stream} has {actual} samples, expected {expected}")]
    LengthMismatch {
        stream: String,
        expected: usize,
        actual: usize,
    },

    /// A stream contains NaN or infinite samples
    #[error("Non-finite sample in {stream} at index {index}")]
    NonFinite { stream: String, index: usize },
}

/// Configuration errors, fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// File could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A parameter has an unusable value
    #[error("Invalid parameter {section}.{parameter}={value}")]
    InvalidParameter {
        section: String,
        parameter: String,
        value: String,
    },
}

/// Result type alias for rideclass operations
pub type Result<T> = std::result::Result<T, RideError>;

impl RideError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RideError::Stream(StreamError::Empty { .. }) => ErrorSeverity::Warning,
            RideError::Stream(_) => ErrorSeverity::Error,
            RideError::Validation(_) => ErrorSeverity::Warning,
            RideError::Configuration(_) => ErrorSeverity::Critical,
            RideError::Io(_) | RideError::Json(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RideError::Stream(StreamError::Empty { stream }) => {
                format!("The ride has no {} data to analyze.", stream)
            }
            RideError::Stream(StreamError::LengthMismatch { .. }) => {
                "The ride's telemetry streams are not aligned and cannot be analyzed.".to_string()
            }
            RideError::Configuration(ConfigError::Unreadable { path, .. }) => {
                format!("Could not read configuration file: {}", path.display())
            }
            RideError::Json(e) => format!("The ride records are not valid JSON: {}", e),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that stops the whole run
    Critical,
    /// Error that skips one ride but lets the batch continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}
