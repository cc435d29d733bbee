//! Itembox Core Library
//!
//! This crate provides the domain models, validation rules, pagination types,
//! configuration, and error taxonomy shared across all Itembox components.
//! The API server and the client both consume the same validation rule table
//! from here, so field constraints cannot drift between the two layers.

pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Item, ItemChanges, NewItem};
pub use pagination::{Page, PageMeta, PageRequest, SortOrder};
