//! Storage gateway for uploaded invoice images.

mod fs;

pub use fs::FsStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Generated, collision-resistant name.
    pub unique_name: String,
    /// Name as uploaded.
    pub original_name: String,
    /// Path the file is served from.
    pub retrieval_path: String,
}

/// Trait for uploaded-file stores.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Persist a file under a freshly generated unique name.
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile>;

    /// Read a stored file back.
    async fn retrieve(&self, unique_name: &str) -> Result<Vec<u8>>;

    /// Delete one stored file.
    async fn delete(&self, unique_name: &str) -> Result<()>;

    /// Delete every stored file, returning how many were removed.
    async fn delete_all(&self) -> Result<usize>;
}

/// Replace every character other than ASCII alphanumerics, `.` and `-` with `_`.
///
/// Directory components sent by some clients are dropped first. Runs of
/// dots collapse to one, so a sanitized name always passes [`validate_name`].
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let mut sanitized = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '.' && sanitized.ends_with('.') {
            continue;
        }
        sanitized.push(c);
    }

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// `<8 hex chars>_<sanitized name>`.
pub fn unique_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}", &token[..8], sanitize_file_name(original_name))
}

/// Reject names that could address anything outside the store.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(['/', '\\', '\0']);

    if invalid {
        Err(StorageError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Content type for serving a stored file, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("receipt 01 (copy).jpg"), "receipt_01__copy_.jpg");
        assert_eq!(sanitize_file_name("café-bill.png"), "caf_-bill.png");
        assert_eq!(sanitize_file_name("C:\\scans\\a.jpg"), "a.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("invoice..jpg"), "invoice.jpg");
        assert_eq!(sanitize_file_name("a...b....png"), "a.b.png");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_unique_name_format() {
        let name = unique_name("My Receipt.JPG");
        let (token, rest) = name.split_once('_').unwrap();
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "My_Receipt.JPG");
        assert_ne!(unique_name("a.jpg"), unique_name("a.jpg"));

        for original in ["invoice..jpg", "..", "...hidden", "a .. b.png"] {
            let name = unique_name(original);
            assert!(validate_name(&name).is_ok(), "{original} -> {name}");
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("0a1b2c3d_receipt.jpg").is_ok());
        assert!(validate_name("../secret").is_err());
        assert!(validate_name("a/b.jpg").is_err());
        assert!(validate_name("a\\b.jpg").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.pdf"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
