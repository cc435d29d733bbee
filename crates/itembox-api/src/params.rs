//! List query parameter parsing.

use itembox_core::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_SORT_BY};
use itembox_core::{AppError, PageRequest, SortOrder};
use serde::Deserialize;

/// Raw query string for GET /items. Values arrive as strings so that a
/// non-numeric `page` yields a 400 instead of an axum rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

fn parse_positive(value: Option<&str>, name: &str, default: u32) -> Result<u32, AppError> {
    match value {
        None => Ok(default),
        Some(raw) => {
            let parsed: u32 = raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("{} must be a positive integer", name)))?;
            if parsed < 1 {
                return Err(AppError::BadRequest(format!("{} must be at least 1", name)));
            }
            Ok(parsed)
        }
    }
}

impl ListQuery {
    /// Normalize into a PageRequest, rejecting malformed values.
    ///
    /// Unknown `sortBy` values pass through here; the repository maps them to
    /// the default sort column. An invalid `order` is a 400.
    pub fn into_page_request(self) -> Result<(PageRequest, Option<String>), AppError> {
        let page = parse_positive(self.page.as_deref(), "page", DEFAULT_PAGE)?;
        let limit = parse_positive(self.limit.as_deref(), "limit", DEFAULT_LIMIT)?;

        let order = match self.order.as_deref() {
            None => SortOrder::Asc,
            Some(raw) => raw.parse::<SortOrder>().map_err(AppError::BadRequest)?,
        };

        let request = PageRequest {
            page,
            limit,
            sort_by: self.sort_by.unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
            order,
        };

        Ok((request, self.search))
    }
}
