//! Filesystem-backed storage gateway.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::{Result, StorageGateway, StoredFile, unique_name, validate_name};
use crate::error::StorageError;

/// Attempts at finding an unused name before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Stores uploads as flat files in one directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    public_path: String,
}

impl FsStorage {
    /// Create a store rooted at `root`, serving files under `public_path`.
    pub fn new(root: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_path: public_path.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, unique_name: &str) -> Result<PathBuf> {
        validate_name(unique_name)?;
        Ok(self.root.join(unique_name))
    }

    fn retrieval_path(&self, unique_name: &str) -> String {
        format!("{}/{}", self.public_path.trim_end_matches('/'), unique_name)
    }
}

fn not_found(name: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io(err)
    }
}

/// Write `bytes` to a freshly created file, deleting it again if the write fails.
async fn write_or_remove<W>(mut writer: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
        }
        return Err(e);
    }
    Ok(())
}

#[async_trait]
impl StorageGateway for FsStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = unique_name(original_name);
            let path = self.root.join(&name);

            let file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(name = %name, "Generated name already taken, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            write_or_remove(file, &path, bytes).await?;

            info!(name = %name, bytes = bytes.len(), "Stored upload");
            return Ok(StoredFile {
                retrieval_path: self.retrieval_path(&name),
                unique_name: name,
                original_name: original_name.to_string(),
            });
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not generate an unused file name",
        )))
    }

    async fn retrieve(&self, unique_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(unique_name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found(unique_name, e))
    }

    async fn delete(&self, unique_name: &str) -> Result<()> {
        let path = self.path_for(unique_name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found(unique_name, e))?;
        info!(name = %unique_name, "Deleted upload");
        Ok(())
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut deleted = 0;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to delete upload");
                    return Err(e.into());
                }
            }
        }

        info!(deleted, dir = %self.root.display(), "Deleted all uploads");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    fn storage(dir: &tempfile::TempDir) -> FsStorage {
        FsStorage::new(dir.path().join("uploads"), "/uploaded_files")
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let stored = storage.store("fuel receipt.jpg", b"jpeg-bytes").await.unwrap();

        assert!(stored.unique_name.ends_with("_fuel_receipt.jpg"));
        assert_eq!(stored.original_name, "fuel receipt.jpg");
        assert_eq!(
            stored.retrieval_path,
            format!("/uploaded_files/{}", stored.unique_name)
        );
        assert_eq!(storage.retrieve(&stored.unique_name).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let first = storage.store("a.png", b"one").await.unwrap();
        let second = storage.store("a.png", b"two").await.unwrap();

        assert_ne!(first.unique_name, second.unique_name);
        assert_eq!(storage.retrieve(&first.unique_name).await.unwrap(), b"one");
        assert_eq!(storage.retrieve(&second.unique_name).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_retrieve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert!(matches!(
            storage.retrieve("deadbeef_nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.delete("deadbeef_nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_double_dot_upload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let stored = storage.store("invoice..jpg", b"bytes").await.unwrap();
        assert!(stored.unique_name.ends_with("_invoice.jpg"));

        assert_eq!(storage.retrieve(&stored.unique_name).await.unwrap(), b"bytes");
        storage.delete(&stored.unique_name).await.unwrap();
        assert!(matches!(
            storage.retrieve(&stored.unique_name).await,
            Err(StorageError::NotFound(_))
        ));
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("disk full")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0a1b2c3d_partial.jpg");
        std::fs::write(&path, b"").unwrap();

        let err = write_or_remove(FailingWriter, &path, b"bytes").await.unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert!(matches!(
            storage.retrieve("../secret.txt").await,
            Err(StorageError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_one() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let stored = storage.store("a.jpg", b"x").await.unwrap();
        storage.delete(&stored.unique_name).await.unwrap();

        assert!(matches!(
            storage.retrieve(&stored.unique_name).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert_eq!(storage.delete_all().await.unwrap(), 0);

        storage.store("a.jpg", b"1").await.unwrap();
        storage.store("b.jpg", b"2").await.unwrap();
        storage.store("c.webp", b"3").await.unwrap();

        assert_eq!(storage.delete_all().await.unwrap(), 3);
        assert_eq!(storage.delete_all().await.unwrap(), 0);
    }
}
