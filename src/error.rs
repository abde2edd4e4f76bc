//! Error types for forecasting operations.

use std::fmt;
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error type for encoding, prediction, training and artifact handling.
#[derive(Debug)]
pub enum ForecastError {
    /// Out-of-range or unparseable user input.
    InvalidInput(String),
    /// The trained model artifact could not be loaded.
    ModelLoad { path: PathBuf, reason: String },
    /// An encoded vector does not match the artifact's feature schema.
    SchemaMismatch {
        expected_features: usize,
        got_features: usize,
        detail: String,
    },
    /// A categorical value was never seen at training time (strict policy only).
    UnknownCategory { field: String, value: String },
    /// Historical data could not be read or is malformed.
    Dataset(String),
    /// Model fitting failed (empty data, bad hyperparameters).
    Training(String),
    /// Serialization or deserialization error.
    Serialization(String),
    /// I/O error during file operations.
    Io(String),
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ForecastError::ModelLoad { path, reason } => {
                write!(f, "Failed to load model from {}: {}", path.display(), reason)
            }
            ForecastError::SchemaMismatch {
                expected_features,
                got_features,
                detail,
            } => write!(
                f,
                "Schema mismatch: expected {} features, got {} ({})",
                expected_features, got_features, detail
            ),
            ForecastError::UnknownCategory { field, value } => {
                write!(f, "Unknown category '{}' for field {}", value, field)
            }
            ForecastError::Dataset(msg) => write!(f, "Dataset error: {}", msg),
            ForecastError::Training(msg) => write!(f, "Training error: {}", msg),
            ForecastError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ForecastError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<bincode::Error> for ForecastError {
    fn from(err: bincode::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Dataset(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}
