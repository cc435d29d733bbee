//! Item CRUD handlers.
//!
//! Photo lifecycle on writes follows one rule: a new derived image is durably
//! stored before the database row points at it, and the superseded image is
//! only removed after the row no longer references it. A failed database
//! write therefore never leaves an item pointing at a missing file; at worst
//! an orphaned file remains, which is cleaned up best-effort.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use itembox_core::validation::{validate_item_update, validate_new_item};
use itembox_core::{AppError, Item, ItemChanges, NewItem};
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::handlers::form::{read_item_form, ItemForm};
use crate::params::ListQuery;
use crate::state::AppState;

/// Malformed ids are indistinguishable from unknown ones to the client.
fn parse_item_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("Item with ID '{}' not found", raw)))
}

/// POST /items
#[tracing::instrument(skip(state, req), fields(operation = "create_item"))]
pub async fn create_item(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_item_form(req, state.config.json_body_limit_bytes).await?;

    let title = form.title.unwrap_or_default();
    let description = form.description.unwrap_or_default();

    // Field validation runs before any file processing, so a bad title plus a
    // huge upload still fails cheaply.
    validate_new_item(&title, &description).map_err(AppError::Validation)?;

    let mut new_item = NewItem::new(title.trim(), description.trim());

    let stored = match form.file {
        Some(file) => Some(state.photos.store(file.data, &file.content_type).await?),
        None => None,
    };
    if let Some(photo) = &stored {
        new_item = new_item.with_photo(photo.filename.clone(), photo.url.clone());
    }

    let item = match state.items.create(new_item).await {
        Ok(item) => item,
        Err(err) => {
            // DB insert failed after the file was written; drop the orphan.
            if let Some(photo) = stored {
                let photos = state.photos.clone();
                tokio::spawn(async move {
                    if let Err(cleanup_err) = photos.remove(&photo.filename).await {
                        tracing::warn!(
                            filename = %photo.filename,
                            error = %cleanup_err,
                            "Failed to clean up photo after create failure"
                        );
                    }
                });
            }
            return Err(err.into());
        }
    };

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items
#[tracing::instrument(skip(state), fields(operation = "list_items"))]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, search) = query.into_page_request()?;
    let page = state.items.find_page(&request, search.as_deref()).await?;
    Ok(Json(page))
}

/// GET /items/{id}
#[tracing::instrument(skip(state), fields(operation = "get_item"))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_item_id(&id)?;
    let item = state.items.find_by_id(id).await?;
    Ok(Json(item))
}

/// PUT /items/{id}
#[tracing::instrument(skip(state, req), fields(operation = "update_item"))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_item_id(&id)?;
    let existing = state.items.find_by_id(id).await?;

    let form = read_item_form(req, state.config.json_body_limit_bytes).await?;
    validate_item_update(form.title.as_deref(), form.description.as_deref())
        .map_err(AppError::Validation)?;

    let (changes, new_photo, superseded) = build_changes(&state, &existing, form).await?;

    let item = match state.items.update(id, changes).await {
        Ok(item) => item,
        Err(err) => {
            // The row still points at the old file; discard the new one.
            if let Some(filename) = new_photo {
                let photos = state.photos.clone();
                tokio::spawn(async move {
                    if let Err(cleanup_err) = photos.remove(&filename).await {
                        tracing::warn!(
                            filename = %filename,
                            error = %cleanup_err,
                            "Failed to clean up photo after update failure"
                        );
                    }
                });
            }
            return Err(err.into());
        }
    };

    // The row no longer references the old file; removal failures only leak
    // disk space, never break the item.
    if let Some(filename) = superseded {
        if let Err(err) = state.photos.remove(&filename).await {
            tracing::warn!(
                filename = %filename,
                error = %err,
                "Failed to remove superseded photo"
            );
        }
    }

    Ok(Json(item))
}

/// Translate a form into repository changes plus the photo bookkeeping:
/// the freshly stored filename (for rollback) and the filename the update
/// supersedes (for removal after commit).
async fn build_changes(
    state: &AppState,
    existing: &Item,
    form: ItemForm,
) -> Result<(ItemChanges, Option<String>, Option<String>), HttpAppError> {
    let mut changes = ItemChanges {
        title: form.title.map(|t| t.trim().to_string()),
        description: form.description.map(|d| d.trim().to_string()),
        ..Default::default()
    };

    if let Some(file) = form.file {
        let stored = state.photos.store(file.data, &file.content_type).await?;
        changes.set_photo(stored.filename.clone(), stored.url);
        return Ok((changes, Some(stored.filename), existing.photo.clone()));
    }

    if form.remove_photo {
        changes.clear_photo();
        return Ok((changes, None, existing.photo.clone()));
    }

    Ok((changes, None, None))
}

/// DELETE /items/{id}
#[tracing::instrument(skip(state), fields(operation = "delete_item"))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_item_id(&id)?;
    let item = state.items.delete(id).await?;

    if let Some(filename) = item.photo {
        if let Err(err) = state.photos.remove(&filename).await {
            tracing::warn!(
                filename = %filename,
                error = %err,
                "Failed to remove photo of deleted item"
            );
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::form::UploadedFile;
    use itembox_core::Config;
    use itembox_db::ItemRepository;
    use itembox_processing::{PhotoPipeline, PhotoValidator};
    use itembox_storage::LocalStorage;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_malformed_id_maps_to_not_found() {
        let err = parse_item_id("not-a-uuid").unwrap_err();
        match err {
            AppError::NotFound(msg) => {
                assert_eq!(msg, "Item with ID 'not-a-uuid' not found");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_well_formed_id_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_item_id(&id.to_string()).unwrap(), id);
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(600, 600, image::Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn sample_item(photo: Option<&str>) -> Item {
        Item {
            id: Uuid::new_v4(),
            title: "Existing title".to_string(),
            description: "An existing description".to_string(),
            photo: photo.map(String::from),
            photo_url: photo.map(|p| format!("http://localhost:3000/uploads/{}", p)),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    // No live database: the lazy pool never connects because build_changes
    // only touches the photo pipeline.
    async fn test_state(dir: &std::path::Path) -> AppState {
        let config = Config {
            server_port: 3000,
            database_url: "postgresql://localhost/itembox".to_string(),
            uploads_dir: dir.display().to_string(),
            host_url: "http://localhost:3000".to_string(),
            max_photo_size_bytes: 5 * 1024 * 1024,
            allowed_photo_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
            ],
            json_body_limit_bytes: 256 * 1024,
            db_max_connections: 20,
            db_timeout_seconds: 30,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
        };

        let storage = LocalStorage::new(dir, "http://localhost:3000/uploads".to_string())
            .await
            .unwrap();
        let validator = PhotoValidator::new(
            config.max_photo_size_bytes,
            config.allowed_photo_content_types.clone(),
        );
        let pool = sqlx::PgPool::connect_lazy(&config.database_url).unwrap();

        AppState {
            config,
            items: ItemRepository::new(pool),
            photos: PhotoPipeline::new(validator, storage),
        }
    }

    #[tokio::test]
    async fn test_build_changes_with_file_supersedes_old_photo() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let existing = sample_item(Some("old.png"));

        let form = ItemForm {
            file: Some(UploadedFile {
                content_type: "image/png".to_string(),
                data: png_bytes(),
            }),
            ..Default::default()
        };

        let (changes, new_photo, superseded) =
            build_changes(&state, &existing, form).await.unwrap();

        let new_filename = new_photo.expect("a new photo was stored");
        assert_eq!(changes.photo, Some(Some(new_filename.clone())));
        assert_eq!(
            changes.photo_url,
            Some(Some(format!(
                "http://localhost:3000/uploads/{}",
                new_filename
            )))
        );
        // old file is only scheduled for removal, not touched yet
        assert_eq!(superseded.as_deref(), Some("old.png"));
        assert!(state.photos.exists(&new_filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_build_changes_remove_image_clears_and_supersedes() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let existing = sample_item(Some("old.png"));

        let form = ItemForm {
            remove_photo: true,
            ..Default::default()
        };

        let (changes, new_photo, superseded) =
            build_changes(&state, &existing, form).await.unwrap();

        assert_eq!(changes.photo, Some(None));
        assert_eq!(changes.photo_url, Some(None));
        assert!(new_photo.is_none());
        assert_eq!(superseded.as_deref(), Some("old.png"));
    }

    #[tokio::test]
    async fn test_build_changes_remove_image_without_existing_photo() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let existing = sample_item(None);

        let form = ItemForm {
            remove_photo: true,
            ..Default::default()
        };

        let (changes, new_photo, superseded) =
            build_changes(&state, &existing, form).await.unwrap();

        assert_eq!(changes.photo, Some(None));
        assert!(new_photo.is_none());
        assert!(superseded.is_none());
    }

    #[tokio::test]
    async fn test_build_changes_field_only_update_leaves_photo_untouched() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let existing = sample_item(Some("old.png"));

        let form = ItemForm {
            title: Some("  Updated title  ".to_string()),
            ..Default::default()
        };

        let (changes, new_photo, superseded) =
            build_changes(&state, &existing, form).await.unwrap();

        assert_eq!(changes.title.as_deref(), Some("Updated title"));
        assert_eq!(changes.photo, None);
        assert_eq!(changes.photo_url, None);
        assert!(new_photo.is_none());
        assert!(superseded.is_none());
    }
}
