//! Configuration default values
//!
//! All the default values for configuration options live here so they can be
//! changed in one place.

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/sheet-catalog.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

// Storage defaults
pub const DEFAULT_ASSET_ROOT: &str = "./data";

// Auth defaults
pub const DEFAULT_TOKEN_TTL: &str = "12h";

// Pagination defaults
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const DEFAULT_MAX_PAGE_LIMIT: u64 = 100;
pub const DEFAULT_SORT_CLAUSE: &str = "updated_at desc";

// Environment
pub const ENV_PREFIX: &str = "SHEET_CATALOG_";
/// Asset root variable kept for deployments that predate the prefixed form
pub const LEGACY_ASSET_ROOT_ENV: &str = "CONFIG_PATH";
