//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use itembox_core::Config;
use itembox_db::ItemRepository;
use itembox_processing::{PhotoPipeline, PhotoValidator};
use itembox_storage::LocalStorage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itembox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    init_tracing();
    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup uploads storage and the photo pipeline
    let storage = LocalStorage::new(config.uploads_dir.clone(), config.uploads_base_url())
        .await
        .context("Failed to initialize uploads storage")?;
    let validator = PhotoValidator::new(
        config.max_photo_size_bytes,
        config.allowed_photo_content_types.clone(),
    );
    let photos = PhotoPipeline::new(validator, storage);

    let state = AppState {
        config: config.clone(),
        items: ItemRepository::new(pool),
        photos,
    };

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
