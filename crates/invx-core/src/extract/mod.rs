//! Invoice field extraction from images.

mod client;
pub mod prompt;

pub use client::{VisionExtractor, mock_fields};
pub use prompt::{parse_fields_json, strip_code_fence};

use async_trait::async_trait;
use invx_vision::MediaType;

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceFields;

/// Either a fully populated record or the reason extraction failed.
pub type ExtractionOutcome = std::result::Result<InvoiceFields, ExtractionError>;

/// Trait for invoice field extractors.
#[async_trait]
pub trait InvoiceExtractor: Send + Sync {
    /// Extract the canonical fields from one invoice image.
    async fn extract(&self, image: &[u8], media_type: MediaType) -> ExtractionOutcome;
}
