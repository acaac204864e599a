//! Application configuration management.
//!
//! Configuration is read from `~/.config/mhtrack/config.json` (or a path
//! given with `--config`). Credentials and language may be overridden by
//! the `MHTRACK_USERNAME`, `MHTRACK_PASSWORD` and `MHTRACK_LANGUAGE`
//! environment variables, which also picks up values from a `.env` file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use mhtrack_core::api::{
    DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHIPMENTS_PATH, DEFAULT_USER_AGENT,
};
use mhtrack_core::{ClientSettings, Credentials, SensorOptions};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "mhtrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Languages the shipments endpoint serves event descriptions in
const SUPPORTED_LANGUAGES: [&str; 3] = ["fi", "sv", "en"];

/// Refresh interval; 10 minutes keeps well clear of the provider's limits.
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub language: String,
    pub prioritize_undelivered: bool,
    pub max_shipments: usize,
    pub stale_shipment_day_limit: u32,
    pub completed_shipment_days_shown: u32,
    pub scan_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub base_url: String,
    pub shipments_path: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            language: "fi".to_string(),
            prioritize_undelivered: true,
            max_shipments: 5,
            stale_shipment_day_limit: 30,
            completed_shipment_days_shown: 7,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
            shipments_path: DEFAULT_SHIPMENTS_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(username) = var("MHTRACK_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = var("MHTRACK_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(language) = var("MHTRACK_LANGUAGE") {
            self.language = language;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.as_deref().map_or(true, str::is_empty) {
            bail!("No username configured (set \"username\" or MHTRACK_USERNAME)");
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            bail!("No password configured (set \"password\" or MHTRACK_PASSWORD)");
        }
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            bail!(
                "Unsupported language {:?}, expected one of {}",
                self.language,
                SUPPORTED_LANGUAGES.join(", ")
            );
        }
        if self.scan_interval_secs == 0 {
            bail!("scan_interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
            self.language.clone(),
        )
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            shipments_path: self.shipments_path.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn sensor_options(&self) -> SensorOptions {
        SensorOptions {
            prioritize_undelivered: self.prioritize_undelivered,
            max_shipments: self.max_shipments,
            stale_shipment_day_limit: self.stale_shipment_day_limit,
            completed_shipment_days_shown: self.completed_shipment_days_shown,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-user cache directory for sensor snapshots.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if let Some(ref username) = self.username {
            path = path.join(cache_segment(username));
        }
        Ok(path)
    }
}

/// Single safe path component for a username: anything outside
/// `[A-Za-z0-9._@-]` becomes `_`, and an all-dot name is replaced outright.
fn cache_segment(username: &str) -> String {
    let segment: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.chars().all(|c| c == '.') {
        "_".repeat(segment.len().max(1))
    } else {
        segment
    }
}
