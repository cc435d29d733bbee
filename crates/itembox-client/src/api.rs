//! Domain methods for the Itembox API client.

use crate::ApiClient;
use anyhow::{Context, Result};
use itembox_core::validation::{validate_item_update, validate_new_item};
use itembox_core::{Item, Page};
use uuid::Uuid;

/// A page of items as returned by GET /items.
pub type ItemPage = Page<Item>;

/// A photo to attach to an item.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl PhotoUpload {
    /// Read a photo from a local file, inferring the content type from the
    /// extension.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.jpg")
            .to_string();

        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            _ => "image/jpeg",
        }
        .to_string();

        Ok(Self {
            filename,
            content_type,
            data,
        })
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    remove_image: bool,
}

fn multipart_form(
    title: Option<&str>,
    description: Option<&str>,
    photo: PhotoUpload,
) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    if let Some(title) = title {
        form = form.text("title", title.to_string());
    }
    if let Some(description) = description {
        form = form.text("description", description.to_string());
    }
    let part = reqwest::multipart::Part::bytes(photo.data)
        .file_name(photo.filename)
        .mime_str(&photo.content_type)
        .context("Invalid photo content type")?;
    Ok(form.part("file", part))
}

impl ApiClient {
    /// Create an item, optionally with a photo. Fields are validated locally
    /// first with the same rules the server applies.
    pub async fn create_item(
        &self,
        title: &str,
        description: &str,
        photo: Option<PhotoUpload>,
    ) -> Result<Item> {
        validate_new_item(title, description)
            .map_err(|messages| anyhow::anyhow!("Validation failed: {}", messages.join("; ")))?;

        match photo {
            Some(photo) => {
                let form = multipart_form(Some(title), Some(description), photo)?;
                self.post_multipart("/items", form).await
            }
            None => {
                let body = ItemBody {
                    title: Some(title),
                    description: Some(description),
                    remove_image: false,
                };
                self.post_json("/items", &body).await
            }
        }
    }

    /// List items. All parameters are optional; the server applies its
    /// defaults (page 1, limit 10, sorted by creation time ascending).
    pub async fn list_items(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        sort_by: Option<&str>,
        order: Option<&str>,
        search: Option<&str>,
    ) -> Result<ItemPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = sort_by {
            query.push(("sortBy", sort_by.to_string()));
        }
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }

        self.get("/items", &query).await
    }

    /// Fetch a single item.
    pub async fn get_item(&self, id: Uuid) -> Result<Item> {
        self.get(&format!("/items/{}", id), &[]).await
    }

    /// Update an item. Omitted fields keep their stored values; a new photo
    /// replaces the current one, and `remove_photo` clears it. A photo upload
    /// and `remove_photo` are mutually exclusive.
    pub async fn update_item(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        photo: Option<PhotoUpload>,
        remove_photo: bool,
    ) -> Result<Item> {
        if photo.is_some() && remove_photo {
            return Err(anyhow::anyhow!(
                "Cannot upload a new photo and remove the photo in the same update"
            ));
        }

        validate_item_update(title, description)
            .map_err(|messages| anyhow::anyhow!("Validation failed: {}", messages.join("; ")))?;

        let path = format!("/items/{}", id);
        match photo {
            Some(photo) => {
                let form = multipart_form(title, description, photo)?;
                self.put_multipart(&path, form).await
            }
            None => {
                let body = ItemBody {
                    title,
                    description,
                    remove_image: remove_photo,
                };
                self.put_json(&path, &body).await
            }
        }
    }

    /// Delete an item and its stored photo.
    pub async fn delete_item(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/items/{}", id)).await
    }
}
