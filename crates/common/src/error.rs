//! Error types for tcsync

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using tcsync Error
pub type Result<T> = std::result::Result<T, Error>;

/// tcsync error types
///
/// Everything here is fatal for a run. Heuristic misses inside the extractor
/// never surface as errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {path}: {source}")]
    IoAt {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path} must be a list (starting with dashes '- '), found {found}")]
    ManifestShape { path: PathBuf, found: String },

    #[error("Manifest record #{index} is invalid: {message}")]
    ManifestRecord { index: usize, message: String },

    #[error("Scan root is not a directory: {0}")]
    InvalidScanRoot(PathBuf),

    #[error("Failed to load config file at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

impl Error {
    /// Attach a path to a raw IO error
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoAt {
            path: path.into(),
            source,
        }
    }
}
