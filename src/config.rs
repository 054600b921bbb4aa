//! User configuration at `~/.growthdesk/config.json`.
//!
//! Every field has a serde default, so a missing or empty file yields a
//! working setup. Secrets (API keys, sheet credentials) stay in the
//! environment of whatever hosts the external collaborators; this file only
//! carries display and retention tunables.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;

pub const DEFAULT_MAX_ARTICLES_PER_SOURCE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// IANA timezone used to resolve "today" for scoring and date stamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Retention cap applied per article source after ingest.
    #[serde(default = "default_max_articles_per_source")]
    pub max_articles_per_source: usize,
    /// TTL for cached directory list reads.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    /// How many book recommendations to ask for.
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,
}

fn default_timezone() -> String {
    "Asia/Seoul".to_string()
}

fn default_max_articles_per_source() -> usize {
    DEFAULT_MAX_ARTICLES_PER_SOURCE
}

fn default_cache_ttl_secs() -> i64 {
    crate::cache::DEFAULT_TTL_SECS
}

fn default_recommendation_count() -> usize {
    crate::recommender::DEFAULT_RECOMMENDATION_COUNT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timezone: default_timezone(),
            max_articles_per_source: default_max_articles_per_source(),
            cache_ttl_secs: default_cache_ttl_secs(),
            recommendation_count: default_recommendation_count(),
        }
    }
}

impl Config {
    /// Clock in the configured display timezone.
    pub fn clock(&self) -> Clock {
        Clock::system_in(&self.timezone)
    }
}

/// Canonical config file path, `~/.growthdesk/config.json`.
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("no home directory for the config file")?;
    Ok(home.join(".growthdesk").join("config.json"))
}

/// Load configuration from disk. A missing file is not an error; it simply
/// means defaults.
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| format!("config unreadable: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("config does not parse: {e}"))
}

/// Write config.json, creating ~/.growthdesk/ on first run.
pub fn save_config(config: &Config) -> Result<(), String> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| format!("config dir: {e}"))?;
        }
    }

    let content =
        serde_json::to_string_pretty(config).map_err(|e| format!("config serialize: {e}"))?;
    fs::write(&path, content).map_err(|e| format!("config write: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timezone, "Asia/Seoul");
        assert_eq!(config.max_articles_per_source, 500);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.recommendation_count, 10);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"maxArticlesPerSource": 200}"#).unwrap();
        assert_eq!(config.max_articles_per_source, 200);
        assert_eq!(config.timezone, "Asia/Seoul");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"cacheTtlSecs\""));
        assert!(json.contains("\"recommendationCount\""));
        assert!(json.contains("\"maxArticlesPerSource\""));
    }
}
