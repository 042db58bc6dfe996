//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which implementation backs the inspection repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Fixture-seeded, in-memory store.
    Mock,
    /// PostgreSQL via `DATABASE_URL`.
    Postgres { database_url: String },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub data_source: DataSource,
    pub forms_path: PathBuf,
    pub mock_inspections_path: PathBuf,
    pub mock_latency: Duration,
    pub autosave: bool,
    pub autosave_delay: Duration,
    pub cors_origin: String,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address = parse_or(&var, "BIND_ADDRESS", "0.0.0.0:3000")?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Data Layer Settings ---
        let data_source = match var("DATA_SOURCE")
            .unwrap_or_else(|| "mock".to_string())
            .to_lowercase()
            .as_str()
        {
            "mock" => DataSource::Mock,
            "postgres" => DataSource::Postgres {
                database_url: var("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "DATA_SOURCE".to_string(),
                    format!("'{}' is not one of mock, postgres", other),
                ))
            }
        };

        let forms_path = var("FORMS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/forms.json"));
        let mock_inspections_path = var("MOCK_INSPECTIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/inspections.json"));

        // --- Session Settings ---
        let mock_latency = Duration::from_millis(parse_or(&var, "MOCK_LATENCY_MS", "0")?);
        let autosave = parse_or(&var, "AUTOSAVE_ENABLED", "true")?;
        let autosave_delay = Duration::from_millis(parse_or(&var, "AUTOSAVE_DELAY_MS", "2000")?);

        Ok(Self {
            bind_address,
            log_level,
            data_source,
            forms_path,
            mock_inspections_path,
            mock_latency,
            autosave,
            autosave_delay,
            cors_origin,
        })
    }
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
