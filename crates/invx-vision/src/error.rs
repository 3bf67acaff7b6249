//! Error types for the vision backend layer.

use thiserror::Error;

/// Errors that can occur while talking to a vision model.
#[derive(Error, Debug)]
pub enum VisionError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("{0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no text content.
    #[error("No content in response")]
    EmptyResponse,

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The requested provider is not compiled into this build.
    #[error("provider not available: {0}")]
    Unavailable(String),
}
