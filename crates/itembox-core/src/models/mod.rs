//! Domain models

mod item;

pub use item::{Item, ItemChanges, NewItem};
