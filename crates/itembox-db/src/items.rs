use chrono::{DateTime, Utc};
use itembox_core::{AppError, Item, ItemChanges, NewItem, Page, PageMeta, PageRequest};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Raw database row for an item.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    title: String,
    description: String,
    photo: Option<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            title: row.title,
            description: row.description,
            photo: row.photo,
            photo_url: row.photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map a requested sort field to a real column. Unknown fields fall back to
/// `created_at` rather than erroring; only values from this table are ever
/// interpolated into SQL.
fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "title" => "title",
        "description" => "description",
        "updatedAt" | "updated_at" => "updated_at",
        "createdAt" | "created_at" => "created_at",
        _ => "created_at",
    }
}

/// Postgres rejects negative OFFSET values, so the u64 skip count must not
/// wrap when bound as i64. Pages past i64::MAX rows are empty anyway.
fn offset_param(request: &PageRequest) -> i64 {
    i64::try_from(request.offset()).unwrap_or(i64::MAX)
}

/// Repository for item persistence.
#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new item and return it with its assigned id and timestamps.
    pub async fn create(&self, new_item: NewItem) -> Result<Item, AppError> {
        let row: ItemRow = sqlx::query_as::<Postgres, ItemRow>(
            r#"
            INSERT INTO items (title, description, photo, photo_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, photo, photo_url, created_at, updated_at
            "#,
        )
        .bind(&new_item.title)
        .bind(&new_item.description)
        .bind(&new_item.photo)
        .bind(&new_item.photo_url)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(item_id = %row.id, "Created item");
        Ok(row.into())
    }

    /// Fetch a single item by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Item, AppError> {
        let row: Option<ItemRow> = sqlx::query_as::<Postgres, ItemRow>(
            "SELECT id, title, description, photo, photo_url, created_at, updated_at \
             FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::from)
            .ok_or_else(|| AppError::NotFound(format!("Item with ID '{}' not found", id)))
    }

    /// Fetch one page of items, sorted per the request, with an optional
    /// case-insensitive title search.
    pub async fn find_page(
        &self,
        request: &PageRequest,
        search: Option<&str>,
    ) -> Result<Page<Item>, AppError> {
        let column = sort_column(&request.sort_by);
        let direction = request.order.as_sql();

        let search_pattern = search
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));

        let total_items: i64 = match &search_pattern {
            Some(pattern) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE title ILIKE $1")
                    .bind(pattern)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM items")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        // column and direction come from fixed tables above, never from input
        let rows: Vec<ItemRow> = match &search_pattern {
            Some(pattern) => {
                sqlx::query_as::<Postgres, ItemRow>(&format!(
                    "SELECT id, title, description, photo, photo_url, created_at, updated_at \
                     FROM items WHERE title ILIKE $1 ORDER BY {} {} LIMIT $2 OFFSET $3",
                    column, direction
                ))
                .bind(pattern)
                .bind(request.limit as i64)
                .bind(offset_param(request))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, ItemRow>(&format!(
                    "SELECT id, title, description, photo, photo_url, created_at, updated_at \
                     FROM items ORDER BY {} {} LIMIT $1 OFFSET $2",
                    column, direction
                ))
                .bind(request.limit as i64)
                .bind(offset_param(request))
                .fetch_all(&self.pool)
                .await?
            }
        };

        let items: Vec<Item> = rows.into_iter().map(Item::from).collect();
        let meta = PageMeta::new(
            total_items as u64,
            items.len() as u64,
            request.page,
            request.limit,
        );

        Ok(Page { items, meta })
    }

    /// Apply a partial update and return the updated item.
    ///
    /// Unset fields keep their stored values; `updated_at` is bumped on every
    /// successful call, even for an empty change set.
    pub async fn update(&self, id: Uuid, changes: ItemChanges) -> Result<Item, AppError> {
        let existing = self.find_by_id(id).await?;

        let title = changes.title.unwrap_or(existing.title);
        let description = changes.description.unwrap_or(existing.description);
        let photo = changes.photo.unwrap_or(existing.photo);
        let photo_url = changes.photo_url.unwrap_or(existing.photo_url);

        let row: ItemRow = sqlx::query_as::<Postgres, ItemRow>(
            r#"
            UPDATE items
            SET title = $2, description = $3, photo = $4, photo_url = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, photo, photo_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&title)
        .bind(&description)
        .bind(&photo)
        .bind(&photo_url)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(item_id = %id, "Updated item");
        Ok(row.into())
    }

    /// Delete an item and return its last stored state, so callers can clean
    /// up any derived image it referenced.
    pub async fn delete(&self, id: Uuid) -> Result<Item, AppError> {
        let row: Option<ItemRow> = sqlx::query_as::<Postgres, ItemRow>(
            "DELETE FROM items WHERE id = $1 \
             RETURNING id, title, description, photo, photo_url, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let item = row
            .map(Item::from)
            .ok_or_else(|| AppError::NotFound(format!("Item with ID '{}' not found", id)))?;

        tracing::info!(item_id = %id, "Deleted item");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_known_fields() {
        assert_eq!(sort_column("title"), "title");
        assert_eq!(sort_column("description"), "description");
        assert_eq!(sort_column("createdAt"), "created_at");
        assert_eq!(sort_column("created_at"), "created_at");
        assert_eq!(sort_column("updatedAt"), "updated_at");
        assert_eq!(sort_column("updated_at"), "updated_at");
    }

    #[test]
    fn test_sort_column_unknown_falls_back() {
        assert_eq!(sort_column("id"), "created_at");
        assert_eq!(sort_column("photo"), "created_at");
        assert_eq!(sort_column("title; DROP TABLE items"), "created_at");
        assert_eq!(sort_column(""), "created_at");
    }

    #[test]
    fn test_offset_param_saturates_instead_of_wrapping() {
        let request = PageRequest {
            page: u32::MAX,
            limit: u32::MAX,
            ..Default::default()
        };
        // u32::MAX squared overflows i64; the bound value must stay positive
        assert_eq!(offset_param(&request), i64::MAX);

        let request = PageRequest {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(offset_param(&request), 20);
    }
}
