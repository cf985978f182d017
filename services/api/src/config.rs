//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Geocoding is best-effort: no key means every place stays ungeocoded.
    pub google_geocoding_key: Option<String>,
    /// Flight search is best-effort: no key means segments come back
    /// `unavailable` with a generic deep link.
    pub duffel_api_key: Option<String>,
    pub profile_model: String,
    pub itinerary_model: String,
    pub research_model: String,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Provider Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let google_geocoding_key = std::env::var("GOOGLE_GEOCODING_KEY").ok();
        let duffel_api_key = std::env::var("DUFFEL_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let profile_model =
            std::env::var("PROFILE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let itinerary_model =
            std::env::var("ITINERARY_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let research_model =
            std::env::var("RESEARCH_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            google_geocoding_key,
            duffel_api_key,
            profile_model,
            itinerary_model,
            research_model,
            allowed_origin,
        })
    }
}
