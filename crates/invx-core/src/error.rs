//! Error types for the invx-core library.

use thiserror::Error;

/// Main error type for the invx library.
#[derive(Error, Debug)]
pub enum InvxError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Storage gateway error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Vision backend setup error.
    #[error("vision backend error: {0}")]
    Vision(#[from] invx_vision::VisionError),

    /// A request did not have the expected shape.
    #[error("{0}")]
    Validation(String),

    /// No invoice record with the given id.
    #[error("invoice not found: {0}")]
    RecordNotFound(String),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors produced while extracting fields from one image.
///
/// The display text of each variant is what a failed batch item shows.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The API credential is not configured.
    #[error("{0} not found in environment")]
    MissingCredential(String),

    /// Network failure, timeout or non-success response.
    #[error("API request failed: {0}")]
    Transport(String),

    /// The model answered without any text.
    #[error("No content in response")]
    NoContent,

    /// The model text was not a JSON object.
    #[error("Failed to parse JSON response")]
    Parse {
        /// Model text after fence stripping, kept for diagnostics.
        raw: String,
    },
}

/// Errors related to the uploaded-file store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No stored file with this name.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The name would escape the storage directory.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Underlying filesystem error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the invx library.
pub type Result<T> = std::result::Result<T, InvxError>;
