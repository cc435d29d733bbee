//! The persisted item entity and its write shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted item.
///
/// `photo` is the storage-relative filename of the derived (resized) image;
/// `photo_url` is the fully qualified URL built from it. The two are either
/// both present or both absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether this item currently references a derived image.
    pub fn has_photo(&self) -> bool {
        self.photo.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Fields for creating an item. The store assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub photo: Option<String>,
    pub photo_url: Option<String>,
}

impl NewItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            photo: None,
            photo_url: None,
        }
    }

    pub fn with_photo(mut self, photo: impl Into<String>, photo_url: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self.photo_url = Some(photo_url.into());
        self
    }
}

/// Partial update of an item.
///
/// The outer `Option` means "field provided or not"; for the photo fields the
/// inner `Option` distinguishes setting a new value from clearing it. An
/// all-`None` value is a no-op update (still bumps `updated_at`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo: Option<Option<String>>,
    pub photo_url: Option<Option<String>>,
}

impl ItemChanges {
    /// Point the photo fields at a new derived image.
    pub fn set_photo(&mut self, photo: String, photo_url: String) {
        self.photo = Some(Some(photo));
        self.photo_url = Some(Some(photo_url));
    }

    /// Clear both photo fields.
    pub fn clear_photo(&mut self) {
        self.photo = Some(None);
        self.photo_url = Some(None);
    }
}
