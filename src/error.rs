//! Error types for spec-depth.

use thiserror::Error;

/// Result type alias for spec-depth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for spec-depth.
///
/// Only configuration loading can fail. Depth decisions and feedback
/// recording always succeed.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
