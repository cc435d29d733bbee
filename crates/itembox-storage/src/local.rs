use crate::{StorageError, StorageResult};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage for the uploads directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the directory if needed.
    ///
    /// # Arguments
    /// * `base_path` - Directory holding derived images (e.g., "./uploads")
    /// * `base_url` - Base URL files are served under (e.g., "http://localhost:3000/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create uploads directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a stored filename to a filesystem path.
    ///
    /// Filenames are flat (no subdirectories); anything containing a path
    /// separator or a `..` sequence is rejected so a crafted name can never
    /// escape the uploads directory.
    fn file_path(&self, filename: &str) -> StorageResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        Ok(self.base_path.join(filename))
    }

    /// Public URL for a stored filename.
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url, filename)
    }

    /// Durably write a file and return its public URL.
    ///
    /// The data is fully written and synced before this returns, so callers
    /// may safely delete a predecessor file afterwards.
    pub async fn write(&self, filename: &str, data: &[u8]) -> StorageResult<String> {
        let path = self.file_path(filename)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored derived image"
        );

        Ok(self.public_url(filename))
    }

    /// Delete a file. Already-absent files are treated as success, including
    /// files that disappear between the caller's decision and the unlink.
    pub async fn delete(&self, filename: &str) -> StorageResult<()> {
        let path = self.file_path(filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted derived image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Delete skipped, file already absent");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check if a file exists.
    pub async fn exists(&self, filename: &str) -> StorageResult<bool> {
        let path = self.file_path(filename)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// Directory files are stored in.
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &std::path::Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/uploads".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_exists() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let url = storage.write("photo.png", b"png bytes").await.unwrap();
        assert_eq!(url, "http://localhost:3000/uploads/photo.png");
        assert!(storage.exists("photo.png").await.unwrap());

        let on_disk = std::fs::read(dir.path().join("photo.png")).unwrap();
        assert_eq!(on_disk, b"png bytes");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage.write("photo.jpg", b"data").await.unwrap();
        storage.delete("photo.jpg").await.unwrap();
        assert!(!storage.exists("photo.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(storage.delete("never-written.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_tolerates_file_removed_underneath() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage.write("photo.png", b"data").await.unwrap();
        // someone else unlinks the file before our delete runs
        std::fs::remove_file(dir.path().join("photo.png")).unwrap();

        assert!(storage.delete("photo.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.write("../escape.png", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));

        let result = storage.delete("nested/escape.png").await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));

        let result = storage.exists("..\\escape.png").await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_normalized() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://host/uploads/".to_string())
            .await
            .unwrap();
        assert_eq!(storage.public_url("a.png"), "http://host/uploads/a.png");
    }
}
