//! HTTP request handlers

mod form;
pub mod items;
