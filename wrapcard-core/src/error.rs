//! Error types for wrapcard-core

use thiserror::Error;

/// Main error type for the wrapcard-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Card export failed
    #[error("export failed: {0}")]
    Export(String),

    /// An export was requested while another one is still running
    #[error("an export is already in progress")]
    ExportInProgress,

    /// AI autofill error
    #[error("autofill error: {0}")]
    Autofill(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type alias for wrapcard-core
pub type Result<T> = std::result::Result<T, Error>;
