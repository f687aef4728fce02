//! Configuration for the analytics layer.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tunables for transport, adapter, and cache behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Base URL of the hosting-provider API.
    pub api_base: String,
    /// Endpoint the report exporter POSTs to. Export is unavailable when
    /// unset.
    pub export_url: Option<String>,
    /// Bearer token for the hosting-provider API.
    pub token: Option<String>,
    /// Retries after the initial attempt for transient failures.
    pub max_retries: u32,
    /// Hard per-attempt timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// First backoff delay; doubles per attempt.
    #[serde(with = "duration_millis")]
    pub retry_base_delay: Duration,
    /// How long a cached result stays valid.
    #[serde(with = "duration_secs")]
    pub cache_max_age: Duration,
    /// Commits fetched per history page (GitHub API max is 100).
    pub commit_page_size: u8,
    /// Recent commits sampled for per-file change statistics.
    pub file_sample_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            export_url: None,
            token: None,
            max_retries: 2,
            request_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_millis(500),
            cache_max_age: Duration::from_secs(3600), // 1 hour
            commit_page_size: 100,
            file_sample_size: 5,
        }
    }
}

impl AnalyticsConfig {
    /// Defaults overridden from the environment.
    ///
    /// `COMMIT_METRICS_TOKEN` (falling back to `GITHUB_TOKEN`),
    /// `COMMIT_METRICS_API_BASE`, and `COMMIT_METRICS_EXPORT_URL` are
    /// recognized.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = std::env::var("COMMIT_METRICS_TOKEN") {
            config.token = Some(token);
        } else if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.token = Some(token);
        }
        if let Ok(base) = std::env::var("COMMIT_METRICS_API_BASE") {
            config.api_base = base;
        }
        if let Ok(url) = std::env::var("COMMIT_METRICS_EXPORT_URL") {
            config.export_url = Some(url);
        }
        config
    }

    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AnalyticsError::Config(format!("read config: {e}")))?;
        toml::from_str(&raw).map_err(|e| AnalyticsError::Config(format!("parse config: {e}")))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.commit_page_size, 100);
        assert_eq!(config.file_sample_size, 5);
        assert!(config.max_retries >= 1);
        assert!(config.request_timeout > Duration::ZERO);
    }

    #[test]
    fn file_overrides_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit-metrics.toml");
        std::fs::write(
            &path,
            "api_base = \"https://git.example.com/api/v3\"\nmax_retries = 5\nrequest_timeout = 10\n",
        )
        .unwrap();

        let config = AnalyticsConfig::from_file(&path).unwrap();
        assert_eq!(config.api_base, "https://git.example.com/api/v3");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        // Untouched keys keep their defaults.
        assert_eq!(config.commit_page_size, 100);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "max_retries = \"lots\"").unwrap();
        assert!(matches!(
            AnalyticsConfig::from_file(&path),
            Err(AnalyticsError::Config(_))
        ));
    }
}
