//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a default, so an empty file is valid.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod policy;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::{AccountConfig, AuthConfig, LoginFailureStatus};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::policy::{PolicyConfig, PolicyStoreKind, ReloadMode};
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session cache settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Policy model and storage settings.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Database connection settings (only used by the relational policy store).
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Login and account settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional; environment variables prefixed with
    /// `GATEHOUSE__` (separator `__`) override any file value, e.g.
    /// `GATEHOUSE__POLICY__STORE=database`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEHOUSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Cross-section consistency checks.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.session.ttl_seconds == 0 {
            return Err(AppError::configuration(
                "session.ttl_seconds must be greater than zero",
            ));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(AppError::configuration(
                "session.cookie_name must not be empty",
            ));
        }
        if self.policy.store == PolicyStoreKind::Database && self.database.is_none() {
            return Err(AppError::configuration(
                "policy.store = \"database\" requires a [database] section",
            ));
        }
        if self.policy.load_timeout_ms == 0 {
            return Err(AppError::configuration(
                "policy.load_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}
