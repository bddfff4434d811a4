//! Configuration for the search service: a YAML file (optional) layered
//! with environment variable overrides, following the teacher's
//! `config.rs` structuring (nested structs, doc-commented fields,
//! `Default` impls) but scoped to this service's own knobs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn env_override<T: std::str::FromStr>(key: &str, current: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(current)
}

/// Gateway (HTTP front door) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Read timeout applied to incoming requests, in seconds.
    pub read_timeout_secs: u64,
    /// Max concurrent `/api/search` requests before a request is rejected
    /// with 503 (spec §4.6's concurrency gate).
    pub search_concurrency: usize,
    /// Token-bucket refill rate, in requests/second, for `/api/isearch`.
    pub search_rate: f64,
    /// Bearer token lifetime, in seconds.
    pub token_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            read_timeout_secs: 10,
            search_concurrency: 10,
            search_rate: 1.0,
            token_ttl_secs: 3600,
        }
    }
}

impl GatewayConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    fn apply_env(&mut self) {
        self.listen_addr = std::env::var("GATEWAY_LISTEN_ADDR").unwrap_or(self.listen_addr.clone());
        self.read_timeout_secs = env_override("GATEWAY_READ_TIMEOUT_SECS", self.read_timeout_secs);
        self.search_concurrency = env_override("SEARCH_CONCURRENCY", self.search_concurrency);
        self.search_rate = env_override("SEARCH_RATE", self.search_rate);
        self.token_ttl_secs = env_override("TOKEN_TTL_SECS", self.token_ttl_secs);
    }
}

/// Ingester settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngesterConfig {
    /// Base URL of the upstream XKCD API, e.g. `https://xkcd.com`.
    pub upstream_base_url: String,
    /// Number of parallel fetch workers.
    pub fetch_concurrency: usize,
    /// Per-request HTTP timeout, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: "https://xkcd.com".to_string(),
            fetch_concurrency: 4,
            fetch_timeout_secs: 10,
        }
    }
}

impl IngesterConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn apply_env(&mut self) {
        self.upstream_base_url =
            std::env::var("XKCD_UPSTREAM_URL").unwrap_or(self.upstream_base_url.clone());
        self.fetch_concurrency = env_override("FETCH_CONCURRENCY", self.fetch_concurrency);
        self.fetch_timeout_secs = env_override("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs);
    }
}

/// Search/index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Period between automatic index rebuilds, in seconds.
    pub index_ttl_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_ttl_secs: 300,
        }
    }
}

impl SearchConfig {
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs)
    }

    fn apply_env(&mut self) {
        self.index_ttl_secs = env_override("INDEX_TTL_SECS", self.index_ttl_secs);
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "xkcd-search.db".to_string(),
        }
    }
}

impl StoreConfig {
    fn apply_env(&mut self) {
        self.database_path = std::env::var("DATABASE_PATH").unwrap_or(self.database_path.clone());
    }
}

/// Credentials are environment-only and required - never defaulted, never
/// read from the YAML file, and never hardcoded (see spec §9's open
/// question about the Go prototype's hardcoded secrets).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub admin_user: String,
    pub admin_password: String,
    pub hmac_secret: String,
}

impl Credentials {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            admin_user: require_env("ADMIN_USER")?,
            admin_password: require_env("ADMIN_PASSWORD")?,
            hmac_secret: require_env("HMAC_SECRET")?,
        })
    }
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing required environment variable {key}"))
}

/// Top-level application settings, assembled from an optional YAML file
/// overlaid with environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub ingester: IngesterConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    gateway: GatewayConfig,
    ingester: IngesterConfig,
    search: SearchConfig,
    store: StoreConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            ingester: IngesterConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional config file path, applying
    /// environment overrides on top, and requiring credentials to be
    /// present in the environment. Fails fast if they are missing.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut file_config = match config_path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&contents)?
            }
            _ => FileConfig::default(),
        };

        file_config.gateway.apply_env();
        file_config.ingester.apply_env();
        file_config.search.apply_env();
        file_config.store.apply_env();

        Ok(Self {
            gateway: file_config.gateway,
            ingester: file_config.ingester,
            search: file_config.search,
            store: file_config.store,
            credentials: Credentials::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_config_defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.search_concurrency, 10);
        assert_eq!(cfg.token_ttl_secs, 3600);
    }

    #[test]
    fn ingester_config_defaults_to_xkcd() {
        let cfg = IngesterConfig::default();
        assert_eq!(cfg.upstream_base_url, "https://xkcd.com");
        assert!(cfg.fetch_concurrency >= 1);
    }
}
