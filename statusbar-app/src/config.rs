//! Configuration file loading
//!
//! The config lives at `~/.iconomi/config.toml` unless `-c` points elsewhere.
//! A missing file is replaced by a template and reported as
//! [`ConfigError::Missing`] so the user can fill in their keys.

use serde::{Deserialize, Serialize};
use statusbar_clients::PriceFeed;
use statusbar_core::{AssetFilter, DisplayCurrency};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const PLACEHOLDER_API_KEY: &str = "APIKEYHERE";
const PLACEHOLDER_SECRET_KEY: &str = "SECRET_KEY_HERE";

const ENV_API_KEY: &str = "ICONOMI_API_KEY";
const ENV_SECRET_KEY: &str = "ICONOMI_SECRET_KEY";

const CONFIG_TEMPLATE: &str = r#"apikey = "APIKEYHERE"
secretkey = "SECRET_KEY_HERE"

# Optional settings
# currency = "EUR"                 # or "USD"
# balance_interval_secs = 60
# price_interval_secs = 60
# request_timeout_secs = 10
# asset_filter = "include_all"     # or "match_reporting_currency"
# price_feed = "coingecko"         # or "coindesk"
"#;

/// Settings read from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub apikey: String,
    pub secretkey: String,
    /// Currency shown on startup
    #[serde(default)]
    pub currency: DisplayCurrency,
    #[serde(default = "default_interval")]
    pub balance_interval_secs: u64,
    #[serde(default = "default_interval")]
    pub price_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub asset_filter: AssetFilter,
    #[serde(default)]
    pub price_feed: PriceFeed,
}

fn default_interval() -> u64 {
    60 // 60 seconds
}

fn default_request_timeout() -> u64 {
    10 // 10 seconds
}

impl AppConfig {
    /// Load, override from the environment and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            write_template(path)?;
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(&raw)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Replace keys with values from `lookup` when present and non-empty
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            info!("Using API key from {}", ENV_API_KEY);
            self.apikey = api_key;
        }
        if let Some(secret_key) = lookup(ENV_SECRET_KEY).filter(|v| !v.is_empty()) {
            info!("Using secret key from {}", ENV_SECRET_KEY);
            self.secretkey = secret_key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apikey.trim().is_empty() || self.apikey == PLACEHOLDER_API_KEY {
            return Err(ConfigError::Invalid("apikey is not set".to_string()));
        }
        if self.secretkey.trim().is_empty() || self.secretkey == PLACEHOLDER_SECRET_KEY {
            return Err(ConfigError::Invalid("secretkey is not set".to_string()));
        }
        if self.balance_interval_secs == 0 || self.price_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "polling intervals must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn balance_interval(&self) -> Duration {
        Duration::from_secs(self.balance_interval_secs)
    }

    pub fn price_interval(&self) -> Duration {
        Duration::from_secs(self.price_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `~/.iconomi/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigError::Invalid("HOME is not set, pass --config".to_string()))?;
    Ok(PathBuf::from(home).join(".iconomi").join("config.toml"))
}

fn write_template(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    fs::write(path, CONFIG_TEMPLATE).map_err(io_err)?;

    // Holds credentials once edited
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    info!("Wrote config template to {}", path.display());
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Default config created at {}, set your apikey and secretkey", path.display())]
    Missing { path: PathBuf },

    #[error("Config error: {0}")]
    Invalid(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
