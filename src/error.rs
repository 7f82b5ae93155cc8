//! Error types for the taxon-buckets library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum BucketError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}' in input table")]
    MissingColumn(String),

    #[error("Invalid numeric value '{value}' at row {row}, column '{column}'")]
    InvalidNumber {
        value: String,
        row: usize,
        column: String,
    },

    #[error("Duplicate sample '{0}' in sample axis")]
    DuplicateSample(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid match pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, BucketError>;
