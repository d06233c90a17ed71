//! Configuration validation for Rhetor services.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;

use crate::config::{AnalyzerConfig, Config, FeedbackConfig, LoggingConfig, TierConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.analyzer.validate() {
            errors.push(e);
        }
        if let Err(e) = self.feedback.validate() {
            errors.push(e);
        }
        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for AnalyzerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "analyzer.base_url".into(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidValue {
                field: "analyzer.base_url".into(),
                reason: "must start with http:// or https://".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "analyzer.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl TierConfig {
    fn validate_tier(&self, tier: &str) -> ValidationResult<()> {
        if self.debounce_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("feedback.{tier}.debounce_ms"),
                reason: "must be greater than zero".into(),
            });
        }
        if self.cache_fresh_secs >= self.cache_evict_secs {
            return Err(ValidationError::InvalidValue {
                field: format!("feedback.{tier}.cache_fresh_secs"),
                reason: "freshness window must be shorter than eviction window".into(),
            });
        }
        Ok(())
    }
}

impl Validate for FeedbackConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.min_content_length == 0 {
            return Err(ValidationError::InvalidValue {
                field: "feedback.min_content_length".into(),
                reason: "must be greater than zero".into(),
            });
        }

        self.fast.validate_tier("fast")?;
        self.slow.validate_tier("slow")?;

        // The fast tier exists to beat the slow tier to the screen.
        if self.fast.debounce_ms >= self.slow.debounce_ms {
            return Err(ValidationError::Conflict {
                reason: format!(
                    "fast debounce ({} ms) must be shorter than slow debounce ({} ms)",
                    self.fast.debounce_ms, self.slow.debounce_ms
                ),
            });
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "logging.level".into(),
                reason: format!("unknown level '{}', expected one of {LEVELS:?}", self.level),
            });
        }
        if self.format != "json" && self.format != "pretty" {
            return Err(ValidationError::InvalidValue {
                field: "logging.format".into(),
                reason: format!("unknown format '{}', expected json or pretty", self.format),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = Config::default();
        config.analyzer.base_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut config = Config::default();
        config.analyzer.base_url = "ftp://analyzer".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_fast_debounce_must_beat_slow() {
        let mut config = Config::default();
        config.feedback.fast.debounce_ms = 3_000;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Conflict { .. })
        ));
    }

    #[test]
    fn test_fresh_window_must_be_shorter_than_eviction() {
        let mut config = Config::default();
        config.feedback.slow.cache_fresh_secs = 600;
        config.feedback.slow.cache_evict_secs = 600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_errors_accumulate() {
        let mut config = Config::default();
        config.analyzer.base_url = String::new();
        config.logging.level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Multiple(_))
        ));
    }
}
