use crate::resize::{self, ResizeError, PHOTO_SIZE};
use crate::validator::{extension_for, PhotoValidator, ValidationError};
use itembox_storage::{LocalStorage, StorageError};
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resize(#[from] ResizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Photo processing failed: {0}")]
    Internal(String),
}

/// A photo that made it through the pipeline.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// Filename under the uploads directory (UUID plus extension)
    pub filename: String,
    /// Public URL the file is served from
    pub url: String,
}

/// Upload pipeline: validate, spool, resize, store.
///
/// The original upload only ever lives in a temp file; the uploads directory
/// holds nothing but finished derived images.
#[derive(Clone)]
pub struct PhotoPipeline {
    validator: PhotoValidator,
    storage: LocalStorage,
}

impl PhotoPipeline {
    pub fn new(validator: PhotoValidator, storage: LocalStorage) -> Self {
        Self { validator, storage }
    }

    /// Process and store an uploaded photo.
    ///
    /// The upload is validated, spooled to a temporary file, resized to a
    /// fixed 500x500 square on the blocking pool, and the derived image is
    /// durably written under a fresh UUID filename. The temp original is
    /// dropped when this returns.
    pub async fn store(&self, data: Vec<u8>, content_type: &str) -> Result<StoredPhoto, PhotoError> {
        self.validator.validate(data.len(), content_type)?;

        let start = std::time::Instant::now();

        // Spool the original outside the uploads directory so half-processed
        // bytes are never publicly reachable.
        let spool = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PhotoError> {
            let mut tmp = tempfile::NamedTempFile::new()
                .map_err(|e| PhotoError::Internal(format!("Failed to create temp file: {}", e)))?;
            tmp.write_all(&data)
                .map_err(|e| PhotoError::Internal(format!("Failed to spool upload: {}", e)))?;

            let original = std::fs::read(tmp.path())
                .map_err(|e| PhotoError::Internal(format!("Failed to read spooled upload: {}", e)))?;
            let resized = resize::resize_to_exact(&original, PHOTO_SIZE, PHOTO_SIZE)?;
            Ok(resized)
        })
        .await
        .map_err(|e| PhotoError::Internal(format!("Resize task panicked: {}", e)))?;

        let resized = spool?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        let url = self.storage.write(&filename, &resized).await?;

        tracing::info!(
            filename = %filename,
            size_bytes = resized.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Processed uploaded photo"
        );

        Ok(StoredPhoto { filename, url })
    }

    /// Remove a stored photo. Already-absent files are treated as success.
    pub async fn remove(&self, filename: &str) -> Result<(), PhotoError> {
        self.storage.delete(filename).await?;
        Ok(())
    }

    /// Check whether a stored photo is present on disk.
    pub async fn exists(&self, filename: &str) -> Result<bool, PhotoError> {
        Ok(self.storage.exists(filename).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    async fn pipeline(dir: &std::path::Path, max_size: usize) -> PhotoPipeline {
        let storage = LocalStorage::new(dir, "http://localhost:3000/uploads".to_string())
            .await
            .unwrap();
        let validator = PhotoValidator::new(
            max_size,
            vec!["image/png".to_string(), "image/jpeg".to_string()],
        );
        PhotoPipeline::new(validator, storage)
    }

    #[tokio::test]
    async fn test_store_writes_resized_square() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let photo = pipeline
            .store(png_bytes(800, 300), "image/png")
            .await
            .unwrap();

        assert!(photo.filename.ends_with(".png"));
        assert_eq!(
            photo.url,
            format!("http://localhost:3000/uploads/{}", photo.filename)
        );

        let on_disk = std::fs::read(dir.path().join(&photo.filename)).unwrap();
        assert_eq!(crate::resize::dimensions(&on_disk), Some((500, 500)));
    }

    #[tokio::test]
    async fn test_store_generates_unique_filenames() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let a = pipeline
            .store(png_bytes(600, 600), "image/png")
            .await
            .unwrap();
        let b = pipeline
            .store(png_bytes(600, 600), "image/png")
            .await
            .unwrap();
        assert_ne!(a.filename, b.filename);
    }

    #[tokio::test]
    async fn test_store_rejects_bad_content_type() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let result = pipeline.store(png_bytes(600, 600), "image/gif").await;
        assert!(matches!(
            result,
            Err(PhotoError::Validation(
                ValidationError::InvalidContentType { .. }
            ))
        ));

        // nothing should have been written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_upload() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 64).await;

        let result = pipeline.store(png_bytes(600, 600), "image/png").await;
        assert!(matches!(
            result,
            Err(PhotoError::Validation(ValidationError::FileTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_store_rejects_empty_upload() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let result = pipeline.store(Vec::new(), "image/png").await;
        assert!(matches!(
            result,
            Err(PhotoError::Validation(ValidationError::EmptyFile))
        ));
    }

    #[tokio::test]
    async fn test_store_rejects_undecodable_bytes() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let result = pipeline.store(b"not an image".to_vec(), "image/png").await;
        assert!(matches!(result, Err(PhotoError::Resize(_))));
    }

    #[tokio::test]
    async fn test_replace_keeps_new_file_after_old_is_removed() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let old = pipeline
            .store(png_bytes(600, 600), "image/png")
            .await
            .unwrap();

        // replacement order: the new file is durably written while the old
        // one still exists, then the old one goes
        let new = pipeline
            .store(png_bytes(800, 400), "image/png")
            .await
            .unwrap();
        assert!(pipeline.exists(&old.filename).await.unwrap());
        assert!(pipeline.exists(&new.filename).await.unwrap());

        pipeline.remove(&old.filename).await.unwrap();
        assert!(!pipeline.exists(&old.filename).await.unwrap());
        assert!(pipeline.exists(&new.filename).await.unwrap());

        let on_disk = std::fs::read(dir.path().join(&new.filename)).unwrap();
        assert_eq!(crate::resize::dimensions(&on_disk), Some((500, 500)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 5 * 1024 * 1024).await;

        let photo = pipeline
            .store(png_bytes(600, 600), "image/png")
            .await
            .unwrap();
        pipeline.remove(&photo.filename).await.unwrap();
        assert!(!pipeline.exists(&photo.filename).await.unwrap());

        // second removal of the same file is still Ok
        pipeline.remove(&photo.filename).await.unwrap();
    }
}
