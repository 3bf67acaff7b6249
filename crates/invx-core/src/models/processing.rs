//! Transient per-file progress tracked while a batch runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file submitted for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// Original file name.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Where a file is in the upload → extract pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ProcessingState {
    Queued,
    Uploading,
    Extracting,
    Done,
    /// Carries the human-readable failure reason.
    Failed(String),
}

impl ProcessingState {
    /// Done or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingState::Done | ProcessingState::Failed(_))
    }

    /// Failure reason, present only for `Failed`.
    pub fn error(&self) -> Option<&str> {
        match self {
            ProcessingState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingState::Queued => "queued",
            ProcessingState::Uploading => "uploading",
            ProcessingState::Extracting => "extracting",
            ProcessingState::Done => "done",
            ProcessingState::Failed(_) => "failed",
        }
    }
}

/// Progress record for one submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingItem {
    /// Token generated at intake.
    pub id: String,
    /// Original file name (display only).
    pub name: String,
    #[serde(flatten)]
    pub state: ProcessingState,
}

impl ProcessingItem {
    /// New item in the `Queued` state.
    pub fn queued(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            state: ProcessingState::Queued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_present_only_when_failed() {
        assert_eq!(ProcessingState::Extracting.error(), None);
        assert_eq!(
            ProcessingState::Failed("boom".to_string()).error(),
            Some("boom")
        );
        assert!(ProcessingState::Done.is_terminal());
        assert!(!ProcessingState::Uploading.is_terminal());
    }

    #[test]
    fn test_item_serialization() {
        let mut item = ProcessingItem::queued("a.jpg");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["state"], "queued");
        assert!(json.get("error").is_none());

        item.state = ProcessingState::Failed("API request failed: timeout".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["error"], "API request failed: timeout");
        assert_eq!(json["name"], "a.jpg");
    }
}
