//! Bounded-concurrency upload → extract pipeline.

use std::sync::Arc;

use futures::future::join_all;
use invx_vision::MediaType;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

use super::{BatchEvent, BatchSummary, SessionSnapshot};
use crate::error::{InvxError, Result, StorageError};
use crate::export::{ExportRow, write_csv};
use crate::extract::InvoiceExtractor;
use crate::models::invoice::{CanonicalField, InvoiceRecord};
use crate::models::processing::{FileBlob, ProcessingItem, ProcessingState};
use crate::storage::StorageGateway;

/// Default number of files processed at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Runs batches of files through storage and extraction and owns the
/// resulting invoice records.
///
/// State is published through a `watch` channel; every change replaces the
/// snapshot atomically.
pub struct BatchOrchestrator {
    storage: Arc<dyn StorageGateway>,
    extractor: Arc<dyn InvoiceExtractor>,
    concurrency: usize,
    state: watch::Sender<SessionSnapshot>,
    events: Option<mpsc::UnboundedSender<BatchEvent>>,
    batch_lock: Mutex<()>,
}

impl BatchOrchestrator {
    pub fn new(storage: Arc<dyn StorageGateway>, extractor: Arc<dyn InvoiceExtractor>) -> Self {
        Self {
            storage,
            extractor,
            concurrency: DEFAULT_CONCURRENCY,
            state: watch::Sender::new(SessionSnapshot::default()),
            events: None,
            batch_lock: Mutex::new(()),
        }
    }

    /// Set how many files of a batch run at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Forward progress events to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Watch the session state.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<InvoiceRecord> {
        self.state.borrow().records.clone()
    }

    /// Process a batch of files.
    ///
    /// Items run in chunks of the configured concurrency; a failed item never
    /// affects the others. Batches submitted while one is running wait for it.
    pub async fn submit(&self, files: Vec<FileBlob>) -> BatchSummary {
        let _guard = self.batch_lock.lock().await;

        let items: Vec<ProcessingItem> = files
            .iter()
            .map(|f| ProcessingItem::queued(&f.name))
            .collect();

        self.state.send_modify(|s| {
            s.busy = true;
            s.processing = items.clone();
        });
        self.emit(BatchEvent::Queued(items.clone()));

        info!(
            files = files.len(),
            concurrency = self.concurrency,
            "Starting batch"
        );

        let mut summary = BatchSummary {
            submitted: files.len(),
            ..Default::default()
        };

        let jobs: Vec<(ProcessingItem, FileBlob)> = items.into_iter().zip(files).collect();
        for (index, chunk) in jobs.chunks(self.concurrency).enumerate() {
            debug!(chunk = index + 1, size = chunk.len(), "Processing chunk");

            let results = join_all(
                chunk
                    .iter()
                    .map(|(item, file)| self.process_item(item, file)),
            )
            .await;

            for ((item, _), result) in chunk.iter().zip(results) {
                match result {
                    Ok(()) => summary.succeeded += 1,
                    Err(msg) => summary.failures.push((item.name.clone(), msg)),
                }
            }
        }

        self.state.send_modify(|s| {
            s.busy = false;
            s.processing.clear();
        });

        info!(
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Batch finished"
        );
        self.emit(BatchEvent::Finished(summary.clone()));

        summary
    }

    async fn process_item(
        &self,
        item: &ProcessingItem,
        file: &FileBlob,
    ) -> std::result::Result<(), String> {
        self.set_state(item, ProcessingState::Uploading);
        let stored = match self.storage.store(&file.name, &file.bytes).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(item, e.to_string())),
        };

        self.set_state(item, ProcessingState::Extracting);
        let media_type = MediaType::from_path(&stored.unique_name);
        let fields = match self.extractor.extract(&file.bytes, media_type).await {
            Ok(fields) => fields,
            Err(e) => return Err(self.fail(item, e.to_string())),
        };

        let record = InvoiceRecord::new(stored, fields);
        debug!(name = %item.name, record = %record.id, "Extracted invoice");
        self.state.send_modify(|s| s.records.push(record.clone()));
        self.emit(BatchEvent::RecordAdded(record));
        self.set_state(item, ProcessingState::Done);

        Ok(())
    }

    fn fail(&self, item: &ProcessingItem, msg: String) -> String {
        warn!(name = %item.name, error = %msg, "Failed to process file");
        self.set_state(item, ProcessingState::Failed(msg.clone()));
        msg
    }

    fn set_state(&self, item: &ProcessingItem, state: ProcessingState) {
        self.state.send_modify(|s| {
            if let Some(entry) = s.processing.iter_mut().find(|i| i.id == item.id) {
                entry.state = state.clone();
            }
        });
        self.emit(BatchEvent::StateChanged {
            id: item.id.clone(),
            name: item.name.clone(),
            state,
        });
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is watching progress.
            let _ = events.send(event);
        }
    }

    /// Overwrite one field of a record.
    pub fn update_field(
        &self,
        id: &str,
        field: CanonicalField,
        value: impl Into<String>,
    ) -> Result<InvoiceRecord> {
        let value = value.into();
        let mut updated = None;

        self.state.send_if_modified(|s| {
            match s.records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.fields.set(field, value);
                    updated = Some(record.clone());
                    true
                }
                None => false,
            }
        });

        updated.ok_or_else(|| InvxError::RecordNotFound(id.to_string()))
    }

    /// Delete a record and its stored image.
    ///
    /// A stored file that is already gone does not block removal.
    pub async fn remove(&self, id: &str) -> Result<InvoiceRecord> {
        let stored_name = self
            .state
            .borrow()
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.stored_file_name.clone())
            .ok_or_else(|| InvxError::RecordNotFound(id.to_string()))?;

        match self.storage.delete(&stored_name).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!(name = %stored_name, "Stored image already gone");
            }
            Err(e) => return Err(e.into()),
        }

        let mut removed = None;
        self.state.send_if_modified(|s| {
            match s.records.iter().position(|r| r.id == id) {
                Some(pos) => {
                    removed = Some(s.records.remove(pos));
                    true
                }
                None => false,
            }
        });

        removed.ok_or_else(|| InvxError::RecordNotFound(id.to_string()))
    }

    /// Delete every stored image and drop all records.
    ///
    /// Returns the number of files removed from storage.
    pub async fn clear(&self) -> Result<usize> {
        let deleted = self.storage.delete_all().await?;
        self.state.send_modify(|s| s.records.clear());
        info!(deleted, "Cleared session");
        Ok(deleted)
    }

    /// CSV of all records in session order.
    pub fn export_csv(&self) -> Result<String> {
        let rows: Vec<ExportRow> = self.state.borrow().records.iter().map(ExportRow::from).collect();
        write_csv(&rows)
    }
}
