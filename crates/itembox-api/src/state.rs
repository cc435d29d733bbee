//! Shared application state

use itembox_core::Config;
use itembox_db::ItemRepository;
use itembox_processing::PhotoPipeline;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub items: ItemRepository,
    pub photos: PhotoPipeline,
}
