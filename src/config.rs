use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Environment variables that override file settings
pub const ENV_BASE_URL: &str = "API_BASE_URL";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_BEARER_TOKEN: &str = "BEARER_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub api: ApiConfig,
    pub server: ServerConfig,
    /// Replaces the built-in tool catalog when set
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
            timeout_ms: 30000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub max_concurrent_calls: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_concurrent_calls: 8 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            api: ApiConfig::default(),
            server: ServerConfig::default(),
            catalog_path: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Overlay values from `lookup` (the process environment in production).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            log::debug!("{} overrides api.base_url", ENV_BASE_URL);
            self.api.base_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api.api_key = Some(key);
        }
        if let Some(token) = get(ENV_BEARER_TOKEN) {
            self.api.bearer_token = Some(token);
        }
    }
}
