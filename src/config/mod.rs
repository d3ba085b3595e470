//! Application configuration module
//!
//! Configuration is loaded from environment variables with the
//! `SELLER_DRAFT` prefix; nested values are separated by `__`. Every
//! section has defaults, so an empty environment yields a runnable
//! in-memory service backed by the mock reply generator.
//!
//! # Example
//!
//! ```no_run
//! use seller_draft::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod drafting;
mod error;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use database::DatabaseConfig;
pub use drafting::DraftingConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory storage when no URL is set
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Reply generator
    #[serde(default)]
    pub ai: AiConfig,

    /// Seller hints and thread replay
    #[serde(default)]
    pub drafting: DraftingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `SELLER_DRAFT__*` variables:
    ///
    /// - `SELLER_DRAFT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SELLER_DRAFT__AI__PROVIDER=openai` -> `ai.provider = OpenAI`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SELLER_DRAFT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.drafting.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
