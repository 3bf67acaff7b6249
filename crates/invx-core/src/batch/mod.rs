//! Batch orchestration and the invoice session it feeds.

mod orchestrator;

pub use orchestrator::BatchOrchestrator;

use serde::{Deserialize, Serialize};

use crate::models::invoice::InvoiceRecord;
use crate::models::processing::{ProcessingItem, ProcessingState};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// True while a batch is running.
    pub busy: bool,
    /// Items of the running batch, in intake order.
    pub processing: Vec<ProcessingItem>,
    /// Extracted records, in completion order.
    pub records: Vec<InvoiceRecord>,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Every item of the batch, all `Queued`, before any work starts.
    Queued(Vec<ProcessingItem>),
    /// An item moved to a new state.
    StateChanged {
        id: String,
        name: String,
        state: ProcessingState,
    },
    /// A record was added to the session.
    RecordAdded(InvoiceRecord),
    /// The batch finished.
    Finished(BatchSummary),
}

/// Outcome of one `submit` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    /// `(file name, failure message)` for each failed item.
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
