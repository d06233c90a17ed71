//! Configuration management for Rhetor services.
//!
//! All Rhetor services share a configuration file at `~/.rhetor/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Explicit config file values
//! 2. Environment variables (RHETOR_* prefix)
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `RHETOR_ANALYZER_URL` → analyzer.base_url
//! - `RHETOR_ANALYZER_TOKEN` → analyzer.bearer_token
//! - `RHETOR_FAST_DEBOUNCE_MS` → feedback.fast.debounce_ms
//! - `RHETOR_SLOW_DEBOUNCE_MS` → feedback.slow.debounce_ms
//! - `RHETOR_LOG_LEVEL` → logging.level
//! - `RHETOR_LOG_FORMAT` → logging.format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".rhetor"),
        |dirs| dirs.home_dir().join(".rhetor"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Analyzer Endpoint Configuration
// ============================================================================

/// Connection settings for the analyzer service hosting both tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Base URL of the analyzer service.
    #[serde(default = "default_analyzer_url")]
    pub base_url: String,

    /// Bearer credential attached to every analyzer request.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: default_analyzer_url(),
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_analyzer_url() -> String {
    "http://127.0.0.1:4500".into()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl AnalyzerConfig {
    /// Endpoint for the fast (heuristic) tier.
    pub fn fast_endpoint(&self) -> String {
        format!("{}/feedback/preview", self.base_url.trim_end_matches('/'))
    }

    /// Endpoint for the slow (AI) tier.
    pub fn slow_endpoint(&self) -> String {
        format!("{}/feedback/preview/ai", self.base_url.trim_end_matches('/'))
    }

    /// Health probe endpoint.
    pub fn health_endpoint(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// Per-Tier Feedback Configuration
// ============================================================================

/// Timing knobs for one analyzer tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Quiet period before the debounced text is propagated, in milliseconds.
    pub debounce_ms: u64,

    /// Backoff before the single automatic retry, in milliseconds.
    pub retry_backoff_ms: u64,

    /// How long a cached result is served without refetching, in seconds.
    pub cache_fresh_secs: u64,

    /// How long a cached result is kept at all, in seconds.
    pub cache_evict_secs: u64,
}

impl TierConfig {
    /// Defaults for the fast (heuristic) tier.
    pub fn fast_defaults() -> Self {
        Self {
            debounce_ms: 400,
            retry_backoff_ms: 1_000,
            cache_fresh_secs: 30,
            cache_evict_secs: 300,
        }
    }

    /// Defaults for the slow (AI) tier. AI results are more expensive and
    /// more stable, so they stay fresh longer.
    pub fn slow_defaults() -> Self {
        Self {
            debounce_ms: 2_500,
            retry_backoff_ms: 2_000,
            cache_fresh_secs: 120,
            cache_evict_secs: 600,
        }
    }
}

/// Coordinator-level feedback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Minimum content length (in characters) before either tier is invoked.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Fast tier timing.
    #[serde(default = "TierConfig::fast_defaults")]
    pub fast: TierConfig,

    /// Slow tier timing.
    #[serde(default = "TierConfig::slow_defaults")]
    pub slow: TierConfig,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_content_length: default_min_content_length(),
            fast: TierConfig::fast_defaults(),
            slow: TierConfig::slow_defaults(),
        }
    }
}

const fn default_min_content_length() -> usize {
    20
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for Rhetor services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer service connection settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Coordinator feedback settings.
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration and apply environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply RHETOR_* environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RHETOR_ANALYZER_URL") {
            if !url.is_empty() {
                self.analyzer.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("RHETOR_ANALYZER_TOKEN") {
            if !token.is_empty() {
                self.analyzer.bearer_token = Some(token);
            }
        }
        if let Ok(ms) = std::env::var("RHETOR_FAST_DEBOUNCE_MS") {
            if let Ok(ms) = ms.parse() {
                self.feedback.fast.debounce_ms = ms;
            }
        }
        if let Ok(ms) = std::env::var("RHETOR_SLOW_DEBOUNCE_MS") {
            if let Ok(ms) = ms.parse() {
                self.feedback.slow.debounce_ms = ms;
            }
        }
        if let Ok(level) = std::env::var("RHETOR_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(format) = std::env::var("RHETOR_LOG_FORMAT") {
            if !format.is_empty() {
                self.logging.format = format;
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let dir = config_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = config_path();
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feedback.min_content_length, 20);
        assert_eq!(config.feedback.fast.debounce_ms, 400);
        assert_eq!(config.feedback.slow.debounce_ms, 2500);
        assert_eq!(config.feedback.fast.cache_fresh_secs, 30);
        assert_eq!(config.feedback.slow.cache_evict_secs, 600);
    }

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let analyzer = AnalyzerConfig {
            base_url: "http://localhost:4500/".into(),
            ..Default::default()
        };
        assert_eq!(
            analyzer.fast_endpoint(),
            "http://localhost:4500/feedback/preview"
        );
        assert_eq!(
            analyzer.slow_endpoint(),
            "http://localhost:4500/feedback/preview/ai"
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"analyzer": {"base_url": "http://analyzer:9000"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.analyzer.base_url, "http://analyzer:9000");
        assert_eq!(config.feedback.fast.debounce_ms, 400);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.analyzer.base_url = "http://analyzer:9000".into();
        config.feedback.slow.debounce_ms = 1_800;
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.analyzer.base_url, "http://analyzer:9000");
        assert_eq!(loaded.feedback.slow.debounce_ms, 1_800);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        std::env::set_var("RHETOR_FAST_DEBOUNCE_MS", "150");
        config.apply_env_overrides();
        std::env::remove_var("RHETOR_FAST_DEBOUNCE_MS");
        assert_eq!(config.feedback.fast.debounce_ms, 150);
    }
}
