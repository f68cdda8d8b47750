use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Requests running longer than this are answered with 408
    #[serde(with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Asset root; PDFs and thumbnails live under `<root>/sheets/`
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens. Empty means an ephemeral key is generated
    /// at startup.
    #[serde(default)]
    pub token_secret: String,
    #[serde(with = "duration_serde::duration")]
    pub token_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            },
            web: WebConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                request_timeout: parse_default_duration(DEFAULT_REQUEST_TIMEOUT),
            },
            storage: StorageConfig {
                root: PathBuf::from(DEFAULT_ASSET_ROOT),
            },
            auth: AuthConfig {
                token_secret: String::new(),
                token_ttl: parse_default_duration(DEFAULT_TOKEN_TTL),
            },
            pagination: PaginationConfig::default(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(30))
}

impl Config {
    /// Layered configuration sources, lowest precedence first:
    /// defaults, the TOML file, `SHEET_CATALOG_*` variables (`__` separates
    /// nesting levels), then the legacy `CONFIG_PATH` asset root.
    pub fn figment<P: AsRef<Path>>(config_file: P) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[LEGACY_ASSET_ROOT_ENV])
                    .map(|_| "storage.root".into()),
            )
    }

    /// Load and validate configuration. A missing file is not an error.
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        let config: Config = Self::figment(config_file).extract().with_context(|| {
            format!(
                "Failed to load configuration from {}",
                config_file.display()
            )
        })?;

        if config_file.exists() {
            info!("Configuration loaded from: {}", config_file.display());
        } else {
            info!(
                "No configuration file at {}, using defaults and environment",
                config_file.display()
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pagination.max_limit == 0 {
            anyhow::bail!("pagination.max_limit must be at least 1");
        }
        if self.pagination.default_limit == 0 {
            anyhow::bail!("pagination.default_limit must be at least 1");
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            anyhow::bail!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                self.pagination.default_limit,
                self.pagination.max_limit
            );
        }
        if self.auth.token_ttl.is_zero() {
            anyhow::bail!("auth.token_ttl must be greater than zero");
        }
        if self.storage.root.as_os_str().is_empty() {
            anyhow::bail!("storage.root cannot be empty");
        }
        Ok(())
    }
}
