//! Configuration loader and validator for the never-miss admin client.
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub backend: Backend,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub reports: Reports,
}

/// Shop context and page behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub shop_domain: String,
    /// Offset used to turn coming-soon dates and times into instants.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_banner_dismiss_ms")]
    pub banner_dismiss_ms: u64,
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

/// Remote backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Backend {
    pub base_url: String,
    /// Host for the install ping; falls back to `base_url`.
    #[serde(default)]
    pub init_base_url: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Static credentials standing in for the host bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub admin_access_token: String,
}

/// Store product catalog (pre-order picker source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub api_version: String,
    pub limit: u32,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            api_version: "2023-10".into(),
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reports {
    pub page_size: u32,
}

impl Default for Reports {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

fn default_banner_dismiss_ms() -> u64 {
    3000
}

fn default_download_dir() -> String {
    "./downloads".into()
}

fn default_user_agent() -> String {
    "never-miss/0.1".into()
}

impl Config {
    pub fn banner_ttl(&self) -> Duration {
        Duration::from_millis(self.app.banner_dismiss_ms)
    }

    /// Shop offset for coming-soon instants. Range is checked by `validate`.
    pub fn utc_offset(&self) -> FixedOffset {
        self.app
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn init_base_url(&self) -> &str {
        self.backend
            .init_base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.backend.base_url)
    }

    /// Ensure the download directory exists.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.download_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.download_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let shop = cfg.app.shop_domain.trim();
    if shop.is_empty() {
        return Err(ConfigError::Invalid("app.shop_domain must be non-empty"));
    }
    if shop.contains('/') || shop.contains("://") {
        return Err(ConfigError::Invalid(
            "app.shop_domain must be a bare host like example.myshopify.com",
        ));
    }
    // +/- 18h is the widest offset chrono accepts
    if cfg.app.utc_offset_minutes.unsigned_abs() >= 18 * 60 {
        return Err(ConfigError::Invalid("app.utc_offset_minutes out of range"));
    }

    if !is_http_url(&cfg.backend.base_url) {
        return Err(ConfigError::Invalid("backend.base_url must be an http(s) URL"));
    }
    if let Some(init) = cfg.backend.init_base_url.as_deref() {
        if !init.trim().is_empty() && !is_http_url(init) {
            return Err(ConfigError::Invalid(
                "backend.init_base_url must be an http(s) URL",
            ));
        }
    }

    if cfg.catalog.api_version.trim().is_empty() {
        return Err(ConfigError::Invalid("catalog.api_version must be non-empty"));
    }
    if cfg.catalog.limit == 0 {
        return Err(ConfigError::Invalid("catalog.limit must be > 0"));
    }
    if cfg.reports.page_size == 0 {
        return Err(ConfigError::Invalid("reports.page_size must be > 0"));
    }

    Ok(())
}

fn is_http_url(raw: &str) -> bool {
    let raw = raw.trim();
    (raw.starts_with("https://") || raw.starts_with("http://")) && reqwest::Url::parse(raw).is_ok()
}

/// Returns an example YAML configuration.
pub fn example() -> &'static str {
    r#"app:
  shop_domain: "example.myshopify.com"
  utc_offset_minutes: 0
  banner_dismiss_ms: 3000
  download_dir: "./downloads"

backend:
  base_url: "https://api.owlnestlabs.com/api/v1/never-miss/shopify/"
  init_base_url: "https://backend.owlnestcommerce.com/api/v1/never-miss/shopify/"
  user_agent: "never-miss/0.1"

auth:
  id_token: "YOUR_SESSION_ID_TOKEN"
  admin_access_token: ""

catalog:
  api_version: "2023-10"
  limit: 20

reports:
  page_size: 10
"#
}
