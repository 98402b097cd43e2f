//! Configuration module for the freekassa CLI.
//!
//! Handles loading settings from an optional TOML file and layering the
//! environment / CLI flag values on top of it.

pub mod file;

use crate::config::file::FileConfig;
use freekassa_sdk::client::GatewayClient;
use freekassa_sdk::config::{Credentials, CredentialsError, DEFAULT_API_URL};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing setting `{name}`: set it in the config file or via {env}")]
    MissingSetting {
        name: &'static str,
        env: &'static str,
    },

    #[error("invalid credentials: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
}

/// Values coming from the environment or CLI flags. They win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub shop_id: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<Url>,
}

/// Unprefixed variable names older setups use for the shop id and key.
pub const LEGACY_SHOP_ID_ENV: &str = "SHOP_ID";
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

impl Overrides {
    /// Fill unset credentials from the unprefixed `SHOP_ID` / `API_KEY`
    /// variables. `FREEKASSA_*` values and flags still win.
    pub fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.shop_id.is_none() {
            self.shop_id = lookup(LEGACY_SHOP_ID_ENV);
        }
        if self.api_key.is_none() {
            self.api_key = lookup(LEGACY_API_KEY_ENV);
        }
        self
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub api_url: Url,
}

impl Settings {
    pub fn into_client(self) -> GatewayClient {
        GatewayClient::with_credentials(self.credentials, self.api_url)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and resolve the settings.
    ///
    /// A missing config file is not an error; everything can come from the
    /// environment instead.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config file at {:?}, using environment only", self.config_path);
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        self.resolve(file_config)
    }

    fn resolve(&self, file_config: FileConfig) -> Result<Settings, ConfigError> {
        let gateway = file_config.gateway;

        let shop_id = self
            .overrides
            .shop_id
            .clone()
            .or(gateway.shop_id)
            .ok_or(ConfigError::MissingSetting {
                name: "shop_id",
                env: "FREEKASSA_SHOP_ID",
            })?;
        let api_key = self
            .overrides
            .api_key
            .clone()
            .or(gateway.api_key)
            .ok_or(ConfigError::MissingSetting {
                name: "api_key",
                env: "FREEKASSA_API_KEY",
            })?;
        let api_url = match self.overrides.api_url.clone().or(gateway.api_url) {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL)?,
        };

        Ok(Settings {
            credentials: Credentials::new(shop_id, api_key)?,
            api_url,
        })
    }
}
