//! Database repositories for the item store.
//!
//! The repository layer owns all SQL; callers work only with the domain
//! models from `itembox-core`. Timestamps are assigned by Postgres so that
//! `created_at`/`updated_at` are consistent regardless of app-server clocks.

pub mod items;

pub use items::ItemRepository;
