//! Core library for invoice image extraction.
//!
//! This crate provides:
//! - Extraction client turning an invoice image into six canonical fields
//!   via a vision-capable language model
//! - Field normalization (alias resolution, sentinel filling, currency
//!   formatting)
//! - Storage gateway for uploaded images
//! - Batch orchestration with bounded concurrency and per-item failure
//!   isolation
//! - CSV export of extracted invoices

pub mod batch;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod storage;

pub use batch::{BatchEvent, BatchOrchestrator, BatchSummary, SessionSnapshot};
pub use error::{ExtractionError, InvxError, Result, StorageError};
pub use export::{ExportRow, write_csv};
pub use extract::{ExtractionOutcome, InvoiceExtractor, VisionExtractor};
pub use models::config::InvxConfig;
pub use models::invoice::{CanonicalField, InvoiceFields, InvoiceRecord, MISSING};
pub use models::processing::{FileBlob, ProcessingItem, ProcessingState};
pub use normalize::{AliasTable, FieldNormalizer, RawValue};
pub use storage::{FsStorage, StorageGateway, StoredFile};

/// Re-export vision types used in the public API.
pub use invx_vision::{Endpoint, MediaType, Provider, VisionBackend};
