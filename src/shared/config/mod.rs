//! Application configuration module
//!
//! `AppConfig` is assembled in three layers: built-in defaults, an optional
//! TOML file, then environment variables. The server binary loads `.env`
//! before calling [`AppConfig::load`], so variables from that file count as
//! environment too.
//!
//! The TOML file is read from `CHATLINE_CONFIG` when set, otherwise from
//! `<config dir>/chatline/config.toml` if it exists.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 7;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 30;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_HISTORY_CAP: u32 = 1000;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TYPING_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_CONNECTION_BUFFER: usize = 64;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Secret used when none is configured; fine for local runs only
const DEV_JWT_SECRET: &str = "chatline-dev-secret-change-me";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub page_size: u32,
    /// Upper bound on messages returned by an unpaged history read
    pub history_cap: u32,
    pub media_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub ping_interval_secs: u64,
    pub typing_timeout_ms: u64,
    /// Per-connection outbound queue length
    pub connection_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            page_size: DEFAULT_PAGE_SIZE,
            history_cap: DEFAULT_HISTORY_CAP,
            media_dir: PathBuf::from("media"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            typing_timeout_ms: DEFAULT_TYPING_TIMEOUT_MS,
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load defaults, then the TOML file (if any), then the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();
        file.apply_to(&mut config);
        Ok(config)
    }

    /// Overlay values from an environment lookup
    ///
    /// The lookup is injected so tests do not need to mutate the process
    /// environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("TOKEN_TTL_SECS") {
            self.token_ttl_secs = parse_var("TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(ttl) = lookup("REFRESH_TOKEN_TTL_SECS") {
            self.refresh_token_ttl_secs = parse_var("REFRESH_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            self.bcrypt_cost = parse_var("BCRYPT_COST", &cost)?;
        }
        if let Some(size) = lookup("PAGE_SIZE") {
            self.page_size = parse_var("PAGE_SIZE", &size)?;
        }
        if let Some(cap) = lookup("HISTORY_CAP") {
            self.history_cap = parse_var("HISTORY_CAP", &cap)?;
        }
        if let Some(dir) = lookup("MEDIA_DIR") {
            self.media_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.history_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "history_cap",
                message: "must be at least 1".to_string(),
            });
        }
        if self.refresh_token_ttl_secs < self.token_ttl_secs {
            return Err(ConfigError::Invalid {
                field: "refresh_token_ttl_secs",
                message: "must not be shorter than token_ttl_secs".to_string(),
            });
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                field: "bcrypt_cost",
                message: format!("{} is outside 4..=31", self.bcrypt_cost),
            });
        }
        if self.connection_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "connection_buffer",
                message: "must be at least 1".to_string(),
            });
        }
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "ping_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the development JWT secret is still in use
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field: name,
        message: format!("cannot parse {:?}", value),
    })
}

/// Path of the TOML config file, if one should be read
fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("CHATLINE_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    dirs::config_dir()
        .map(|dir| dir.join("chatline").join("config.toml"))
        .filter(|path| path.exists())
}

/// On-disk shape; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    refresh_token_ttl_secs: Option<u64>,
    bcrypt_cost: Option<u32>,
    page_size: Option<u32>,
    history_cap: Option<u32>,
    media_dir: Option<PathBuf>,
    max_upload_bytes: Option<usize>,
    ping_interval_secs: Option<u64>,
    typing_timeout_ms: Option<u64>,
    connection_buffer: Option<usize>,
}

impl FileConfig {
    fn apply_to(self, config: &mut AppConfig) {
        if let Some(v) = self.host {
            config.host = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if self.database_url.is_some() {
            config.database_url = self.database_url;
        }
        if let Some(v) = self.jwt_secret {
            config.jwt_secret = v;
        }
        if let Some(v) = self.token_ttl_secs {
            config.token_ttl_secs = v;
        }
        if let Some(v) = self.refresh_token_ttl_secs {
            config.refresh_token_ttl_secs = v;
        }
        if let Some(v) = self.bcrypt_cost {
            config.bcrypt_cost = v;
        }
        if let Some(v) = self.page_size {
            config.page_size = v;
        }
        if let Some(v) = self.history_cap {
            config.history_cap = v;
        }
        if let Some(v) = self.media_dir {
            config.media_dir = v;
        }
        if let Some(v) = self.max_upload_bytes {
            config.max_upload_bytes = v;
        }
        if let Some(v) = self.ping_interval_secs {
            config.ping_interval_secs = v;
        }
        if let Some(v) = self.typing_timeout_ms {
            config.typing_timeout_ms = v;
        }
        if let Some(v) = self.connection_buffer {
            config.connection_buffer = v;
        }
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: Option<AppConfig>,
}

impl AppConfigBuilder {
    fn inner(&mut self) -> &mut AppConfig {
        self.config.get_or_insert_with(AppConfig::default)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.inner().host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.inner().port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.inner().database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.inner().jwt_secret = secret.into();
        self
    }

    pub fn token_ttl_secs(mut self, secs: u64) -> Self {
        self.inner().token_ttl_secs = secs;
        self
    }

    pub fn refresh_token_ttl_secs(mut self, secs: u64) -> Self {
        self.inner().refresh_token_ttl_secs = secs;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.inner().bcrypt_cost = cost;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.inner().page_size = size;
        self
    }

    pub fn history_cap(mut self, cap: u32) -> Self {
        self.inner().history_cap = cap;
        self
    }

    pub fn media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner().media_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.inner().max_upload_bytes = bytes;
        self
    }

    pub fn ping_interval_secs(mut self, secs: u64) -> Self {
        self.inner().ping_interval_secs = secs;
        self
    }

    pub fn typing_timeout_ms(mut self, ms: u64) -> Self {
        self.inner().typing_timeout_ms = ms;
        self
    }

    pub fn connection_buffer(mut self, len: usize) -> Self {
        self.inner().connection_buffer = len;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("cannot read config file {path:?}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("cannot parse config file: {0}")]
    Parse(String),
}
