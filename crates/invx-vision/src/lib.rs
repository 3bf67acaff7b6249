//! Vision-model backend abstraction for invx.
//!
//! This crate provides a unified interface for sending an image plus a pair
//! of prompts to a vision-capable language model and getting the model's
//! text reply back:
//! - `anthropic` for the Anthropic Messages API
//! - `openai` for OpenAI-compatible chat completions

mod backend;
mod error;
mod request;

pub use backend::{Endpoint, Provider, VisionBackend};
pub use error::VisionError;
pub use request::{MediaType, VisionRequest};

#[cfg(feature = "anthropic")]
pub use backend::anthropic::AnthropicBackend;

#[cfg(feature = "openai")]
pub use backend::openai::OpenAiBackend;

/// Result type for vision backend operations.
pub type Result<T> = std::result::Result<T, VisionError>;
