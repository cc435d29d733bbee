//! Pagination and sorting types for item list queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_SORT_BY: &str = "createdAt";

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("order must be 'asc' or 'desc', got '{}'", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized list query: page and limit are always >= 1 by the time a
/// request reaches the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort_by: String,
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: DEFAULT_SORT_BY.to_string(),
            order: SortOrder::Asc,
        }
    }
}

impl PageRequest {
    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub item_count: u64,
    pub items_per_page: u32,
    pub total_pages: u64,
    pub current_page: u32,
}

impl PageMeta {
    pub fn new(total_items: u64, item_count: u64, page: u32, limit: u32) -> Self {
        Self {
            total_items,
            item_count,
            items_per_page: limit,
            total_pages: total_items.div_ceil(limit as u64),
            current_page: page,
        }
    }
}

/// A page of results plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_math() {
        let meta = PageMeta::new(25, 10, 1, 10);
        assert_eq!(meta.total_items, 25);
        assert_eq!(meta.item_count, 10);
        assert_eq!(meta.items_per_page, 10);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 1);
    }

    #[test]
    fn test_page_meta_exact_multiple() {
        let meta = PageMeta::new(20, 10, 2, 10);
        assert_eq!(meta.total_pages, 2);
    }

    #[test]
    fn test_page_meta_empty() {
        let meta = PageMeta::new(0, 0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.item_count, 0);
    }

    #[test]
    fn test_page_meta_serializes_camel_case() {
        let meta = PageMeta::new(3, 3, 1, 10);
        let json = serde_json::to_value(&meta).expect("serialize");
        assert_eq!(json["totalItems"], 3);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["itemCount"], 3);
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(req.offset(), 20);
        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("ascending".parse::<SortOrder>().is_err());
        assert!("ASC".parse::<SortOrder>().is_err());
    }
}
