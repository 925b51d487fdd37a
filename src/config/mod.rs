//! Builds an `AppConfig` from the config files and the environment.
//! Files in `./config` are layered with `figment`: `base.toml` first, then the file matching
//! `APP_ENVIRONMENT`, then `APP_`-prefixed environment variables (`__` separates nested keys).
//! `DATABASE_URL` and `WAITLIST_SECRET` override their sections last.

mod error;
mod types;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, DbConfig, Environment, NetConfig, SslRequire, StoreKind, WaitlistConfig};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const WAITLIST_SECRET_ENV: &str = "WAITLIST_SECRET";

impl AppConfig {
    /// Loads the configuration from `./config` relative to the current directory.
    pub fn load() -> ConfigResult<Self> {
        let base_path = std::env::current_dir()?;
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;

        Self::load_from(base_path.join("config"), environment)
    }

    pub fn load_from(config_dir: impl AsRef<Path>, environment: Environment) -> ConfigResult<Self> {
        info!(
            "{:<20} - {}",
            "Loading config for:",
            environment.as_ref().to_lowercase()
        );
        let config_dir = config_dir.as_ref();
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut config: AppConfig = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()
            .map_err(Box::new)?;

        if let Ok(db_url) = std::env::var(DATABASE_URL_ENV) {
            config.db_config = config.db_config.with_url(&db_url)?;
        }
        if let Ok(secret) = std::env::var(WAITLIST_SECRET_ENV) {
            config.waitlist_config.list_secret = SecretString::from(secret);
        }

        config.validate()?;

        Ok(config)
    }

    /// Rejects configurations that would make the listing endpoint reachable without a secret.
    pub fn validate(&self) -> ConfigResult<()> {
        if self
            .waitlist_config
            .list_secret
            .expose_secret()
            .trim()
            .is_empty()
        {
            return Err(ConfigError::EmptyListSecret);
        }

        Ok(())
    }
}
