//! Runtime settings for the HTTP binary.
//!
//! Settings come from the environment (optionally seeded from a `.env`
//! file).  Every variable has a sensible default so the service starts
//! with no configuration at all.

use crate::country::CountryRegistry;
use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const BIND_ADDR_VAR: &str = "EWA_BIND_ADDR";
pub const COUNTRY_CONFIG_DIR_VAR: &str = "EWA_COUNTRY_CONFIG_DIR";
pub const LOG_VAR: &str = "EWA_LOG";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// When set, country configurations are read from this directory
    /// instead of the built-in set.
    pub country_config_dir: Option<PathBuf>,
    pub log_filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("EWA_BIND_ADDR must be a socket address such as 127.0.0.1:3000, got '{value}'")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

impl Settings {
    /// Read `.env` if present, then the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        let raw_addr = env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let country_config_dir = env::var(COUNTRY_CONFIG_DIR_VAR)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let log_filter = env::var(LOG_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            bind_addr,
            country_config_dir,
            log_filter,
        })
    }

    /// The registry these settings point at.
    pub fn registry(&self) -> Result<CountryRegistry, ConfigError> {
        match &self.country_config_dir {
            Some(dir) => CountryRegistry::from_dir(dir),
            None => CountryRegistry::builtin(),
        }
    }
}
