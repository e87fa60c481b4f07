//! Error types for the resource tracking core

use thiserror::Error;

/// Errors surfaced by tracker handles and configuration loading.
///
/// Registry construction, event application and capability resolution never
/// fail; storage problems there degrade to "data unavailable".
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resource view for {0} is closed")]
    ViewClosed(String),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
