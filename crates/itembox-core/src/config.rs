//! Configuration module
//!
//! Application configuration loaded from the environment (dotenv-aware),
//! with validated defaults. One flat struct: the surface is small enough
//! that getter indirection would add nothing.

use std::env;

const DEFAULT_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_PHOTO_SIZE_MB: usize = 5;
const JSON_BODY_LIMIT_KB: usize = 256;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub uploads_dir: String,
    pub host_url: String,
    pub max_photo_size_bytes: usize,
    pub allowed_photo_content_types: Vec<String>,
    pub json_body_limit_bytes: usize,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_photo_size_mb = env::var("MAX_PHOTO_SIZE_MB")
            .unwrap_or_else(|_| MAX_PHOTO_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_PHOTO_SIZE_MB);

        let allowed_photo_content_types = env::var("ALLOWED_PHOTO_CONTENT_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/jpg,image/png".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = Config {
            server_port,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            uploads_dir: env::var("UPLOADS_FOLDER").unwrap_or_else(|_| "./uploads".to_string()),
            host_url: env::var("HOST_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            max_photo_size_bytes: max_photo_size_mb * 1024 * 1024,
            allowed_photo_content_types,
            json_body_limit_bytes: env::var("JSON_BODY_LIMIT_KB")
                .unwrap_or_else(|_| JSON_BODY_LIMIT_KB.to_string())
                .parse::<usize>()
                .unwrap_or(JSON_BODY_LIMIT_KB)
                * 1024,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            cors_origins,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_photo_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_PHOTO_SIZE_MB must be greater than zero"));
        }

        if self.allowed_photo_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_PHOTO_CONTENT_TYPES must name at least one MIME type"
            ));
        }

        if self.host_url.trim_end_matches('/').is_empty() {
            return Err(anyhow::anyhow!("HOST_URL must not be empty"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }

    /// Base URL under which derived images are publicly served.
    pub fn uploads_base_url(&self) -> String {
        format!("{}/uploads", self.host_url.trim_end_matches('/'))
    }
}
