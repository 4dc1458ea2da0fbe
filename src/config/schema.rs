//! Configuration schema types for `gsmaterial.toml`
//!
//! Defines the structure, defaults and validation rules of the application
//! configuration. One [`AppConfig`] is built at startup and shared by
//! reference with every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Where persisted files and asset directories live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root data directory holding config.json, sub.json and asset folders
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data").join("gsmaterial")
}

/// Rendering switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Drop 3-star entries from daily images
    #[serde(default = "default_true")]
    pub skip_three: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { skip_three: true }
    }
}

fn default_true() -> bool {
    true
}

/// Daily refresh and push schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Run the daily push loop under `serve`
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local time of the daily push, `H:MM`
    #[serde(default = "default_time")]
    pub time: String,
    /// Random pause between two deliveries, `[min, max]` seconds
    #[serde(default = "default_push_delay")]
    pub push_delay_secs: [u64; 2],
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { enabled: true, time: default_time(), push_delay_secs: default_push_delay() }
    }
}

fn default_time() -> String {
    "8:10".to_string()
}

fn default_push_delay() -> [u64; 2] {
    [5, 10]
}

impl ScheduleConfig {
    /// Parse `time` into `(hour, minute)`.
    pub fn hour_minute(&self) -> Option<(u32, u32)> {
        let (h, m) = self.time.trim().split_once(':')?;
        let h = h.parse::<u32>().ok()?;
        let m = m.parse::<u32>().ok()?;
        (h < 24 && m < 60).then_some((h, m))
    }
}

/// Upstream endpoints, mirror and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the game data API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Base URL of the font and banner assets
    #[serde(default = "default_assets_base")]
    pub assets_base: String,
    /// Prefix prepended to every asset URL, e.g. a download proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed pause between attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            assets_base: default_assets_base(),
            mirror: None,
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.ambr.top".to_string()
}

fn default_assets_base() -> String {
    "https://cdn.monsterx.cn/bot/gsmaterial".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    /// Apply the mirror prefix, if any, to an asset URL.
    pub fn mirrored(&self, url: &str) -> String {
        match self.mirror.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, url),
            _ => url.to_string(),
        }
    }
}

/// A config validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl AppConfig {
    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.schedule.enabled && self.schedule.hour_minute().is_none() {
            issues.push(ConfigIssue {
                field: "schedule.time",
                message: format!("'{}' is not a valid H:MM time", self.schedule.time),
            });
        }
        let [min, max] = self.schedule.push_delay_secs;
        if min > max {
            issues.push(ConfigIssue {
                field: "schedule.push_delay_secs",
                message: format!("minimum {} exceeds maximum {}", min, max),
            });
        }
        if self.network.retry_attempts == 0 {
            issues.push(ConfigIssue {
                field: "network.retry_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.network.timeout_secs == 0 {
            issues.push(ConfigIssue {
                field: "network.timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            issues.push(ConfigIssue {
                field: "storage.data_dir",
                message: "must not be empty".to_string(),
            });
        }

        issues
    }

    pub fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    /// `config.json`
    pub fn canonical_path(&self) -> PathBuf {
        self.storage.data_dir.join("config.json")
    }

    /// `sub.json`
    pub fn subscription_path(&self) -> PathBuf {
        self.storage.data_dir.join("sub.json")
    }

    /// Directory of rendered images
    pub fn cache_dir(&self) -> PathBuf {
        self.storage.data_dir.join("cache")
    }

    /// Directory of fonts and banners
    pub fn draw_dir(&self) -> PathBuf {
        self.storage.data_dir.join("draw")
    }

    /// Configuration rooted at `data_dir` with every other value defaulted.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig { data_dir: data_dir.into() },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.render.skip_three);
        assert_eq!(config.schedule.hour_minute(), Some((8, 10)));
        assert_eq!(config.network.retry_attempts, 3);
        assert_eq!(config.network.retry_delay_secs, 2);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_hour_minute_rejects_garbage() {
        let mut schedule = ScheduleConfig::default();
        schedule.time = "25:00".to_string();
        assert_eq!(schedule.hour_minute(), None);
        schedule.time = "8".to_string();
        assert_eq!(schedule.hour_minute(), None);
        schedule.time = " 07:05 ".to_string();
        assert_eq!(schedule.hour_minute(), Some((7, 5)));
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut config = AppConfig::default();
        config.schedule.time = "noon".to_string();
        config.schedule.push_delay_secs = [10, 5];
        config.network.retry_attempts = 0;
        let fields: Vec<&str> = config.validate().iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec!["schedule.time", "schedule.push_delay_secs", "network.retry_attempts"]
        );
    }

    #[test]
    fn test_mirror_prefix() {
        let mut network = NetworkConfig::default();
        assert_eq!(network.mirrored("https://a/b.png"), "https://a/b.png");
        network.mirror = Some("https://proxy.example/".to_string());
        assert_eq!(network.mirrored("https://a/b.png"), "https://proxy.example/https://a/b.png");
        network.mirror = Some("  ".to_string());
        assert_eq!(network.mirrored("https://a/b.png"), "https://a/b.png");
    }

    #[test]
    fn test_paths() {
        let config = AppConfig::with_data_dir("/tmp/gs");
        assert_eq!(config.canonical_path(), PathBuf::from("/tmp/gs/config.json"));
        assert_eq!(config.subscription_path(), PathBuf::from("/tmp/gs/sub.json"));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/gs/cache"));
    }
}
