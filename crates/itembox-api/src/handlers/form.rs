//! Item form extraction.
//!
//! Create and update accept either `multipart/form-data` (with an optional
//! `file` part) or a plain JSON body. Both are normalized into `ItemForm`
//! before any domain logic runs.

use axum::extract::{FromRequest, Multipart, Request};
use itembox_core::AppError;
use serde::Deserialize;

/// An uploaded photo, still unvalidated.
#[derive(Debug)]
pub struct UploadedFile {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Normalized create/update input.
#[derive(Debug, Default)]
pub struct ItemForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file: Option<UploadedFile>,
    pub remove_photo: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ItemBody {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    remove_image: bool,
}

/// Read an item form from the request, dispatching on Content-Type.
///
/// `json_body_limit` caps plain JSON bodies; multipart bodies are capped
/// upstream by the route's body limit layer.
pub async fn read_item_form(req: Request, json_body_limit: usize) -> Result<ItemForm, AppError> {
    let content_type = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        read_multipart(multipart).await
    } else {
        read_json(req, json_body_limit).await
    }
}

/// Whether a body read failure was caused by the length limit, as opposed to
/// a transport error.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

async fn read_json(req: Request, limit: usize) -> Result<ItemForm, AppError> {
    let bytes = axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|e| {
            if is_length_limit(&e) {
                AppError::PayloadTooLarge(format!("JSON body exceeds {} bytes", limit))
            } else {
                AppError::BadRequest(format!("Failed to read request body: {}", e))
            }
        })?;

    let body: ItemBody = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?;

    Ok(ItemForm {
        title: body.title,
        description: body.description,
        file: None,
        remove_photo: body.remove_image,
    })
}

async fn read_multipart(mut multipart: Multipart) -> Result<ItemForm, AppError> {
    let mut form = ItemForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => {
                form.title = Some(read_text(field, "title").await?);
            }
            "description" => {
                form.description = Some(read_text(field, "description").await?);
            }
            "removeImage" => {
                let value = read_text(field, "removeImage").await?;
                form.remove_photo = value.eq_ignore_ascii_case("true");
            }
            "file" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read uploaded file: {}", e))
                })?;
                form.file = Some(UploadedFile {
                    content_type,
                    data: data.to_vec(),
                });
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected form field '{}'",
                    other
                )));
            }
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))
}
