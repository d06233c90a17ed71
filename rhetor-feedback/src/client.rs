//! HTTP client for the two analyzer endpoints.
//!
//! Both tiers live behind the same analyzer service: the fast heuristic
//! tier at `/feedback/preview` and the slow AI tier at
//! `/feedback/preview/ai`. The client owns only the request lifecycle; it
//! never touches the result cache.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rhetor_common::Config;

use crate::snapshot::ContentSnapshot;
use crate::types::{AnalysisResult, AnalyzeRequest, AnalyzeResponse, AnalyzerTier};

/// Error surfaced by one analyzer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    /// Content below the minimum analyzable length; never sent to the network
    ContentTooShort { length: usize, min: usize },
    /// Missing or invalid credentials (401)
    Unauthorized(String),
    /// Server rejected the request body (400); message passed through
    ValidationFailed(String),
    /// Rate limit exceeded (429)
    RateLimited { retry_after_secs: Option<u64> },
    /// Slow tier temporarily down (503); signals "fall back to fast tier"
    ServiceUnavailable,
    /// Any other non-2xx response
    RequestFailed { status: u16, message: String },
    /// Connection-level failure (DNS, refused, timeout)
    Network(String),
    /// Response body did not match the expected shape
    Parse(String),
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentTooShort { length, min } => {
                write!(f, "Content too short to analyze: {length} < {min} characters")
            }
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "Validation failed: {msg}"),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {secs} seconds")?;
                }
                Ok(())
            }
            Self::ServiceUnavailable => write!(f, "Analyzer temporarily unavailable"),
            Self::RequestFailed { status, message } => {
                write!(f, "Analyzer request failed: HTTP {status} - {message}")
            }
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Parse(msg) => write!(f, "Failed to parse analyzer response: {msg}"),
        }
    }
}

impl std::error::Error for AnalyzerError {}

impl AnalyzerError {
    /// Whether the single automatic retry applies.
    ///
    /// Transient means network-level failures and retryable 5xx responses.
    /// Auth, validation, and rate-limit errors are surfaced immediately,
    /// as is the slow tier's 503 degradation signal.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RequestFailed { status: 500..=599, .. }
        )
    }

    /// Whether this error means "continue with the other tier, say nothing".
    pub const fn is_silent_degradation(&self) -> bool {
        matches!(self, Self::ServiceUnavailable)
    }
}

impl From<AnalyzerError> for rhetor_common::Error {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::ContentTooShort { .. } | AnalyzerError::ValidationFailed(_) => {
                Self::InvalidInput(err.to_string())
            }
            AnalyzerError::Unauthorized(_) => Self::Auth(err.to_string()),
            AnalyzerError::RateLimited { .. } => Self::RateLimited(err.to_string()),
            AnalyzerError::ServiceUnavailable => Self::Degraded(err.to_string()),
            _ => Self::External(err.to_string()),
        }
    }
}

/// Boundary trait for issuing one analysis request.
///
/// The coordinator depends on this rather than the concrete HTTP client so
/// its state machine is testable without a network.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one snapshot on the given tier.
    async fn analyze(
        &self,
        tier: AnalyzerTier,
        snapshot: &ContentSnapshot,
    ) -> Result<AnalysisResult, AnalyzerError>;
}

/// Configuration for the analyzer client.
#[derive(Debug, Clone)]
pub struct AnalyzerClientConfig {
    /// Fast tier endpoint URL
    pub fast_endpoint: String,
    /// Slow tier endpoint URL
    pub slow_endpoint: String,
    /// Health probe URL
    pub health_endpoint: String,
    /// Bearer credential attached to every request
    pub bearer_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Backoff before the single fast-tier retry
    pub fast_retry_backoff: Duration,
    /// Backoff before the single slow-tier retry
    pub slow_retry_backoff: Duration,
    /// Minimum analyzable content length in characters
    pub min_content_length: usize,
}

impl AnalyzerClientConfig {
    /// Derive client settings from the shared service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            fast_endpoint: config.analyzer.fast_endpoint(),
            slow_endpoint: config.analyzer.slow_endpoint(),
            health_endpoint: config.analyzer.health_endpoint(),
            bearer_token: config.analyzer.bearer_token.clone(),
            timeout: Duration::from_secs(config.analyzer.timeout_secs),
            fast_retry_backoff: Duration::from_millis(config.feedback.fast.retry_backoff_ms),
            slow_retry_backoff: Duration::from_millis(config.feedback.slow.retry_backoff_ms),
            min_content_length: config.feedback.min_content_length,
        }
    }
}

impl Default for AnalyzerClientConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Client for the analyzer service.
pub struct AnalyzerClient {
    /// Configuration
    config: AnalyzerClientConfig,
    /// HTTP client
    client: reqwest::Client,
}

impl AnalyzerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: AnalyzerClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    fn endpoint(&self, tier: AnalyzerTier) -> &str {
        match tier {
            AnalyzerTier::Fast => &self.config.fast_endpoint,
            AnalyzerTier::Slow => &self.config.slow_endpoint,
        }
    }

    fn retry_backoff(&self, tier: AnalyzerTier) -> Duration {
        match tier {
            AnalyzerTier::Fast => self.config.fast_retry_backoff,
            AnalyzerTier::Slow => self.config.slow_retry_backoff,
        }
    }

    /// Send a request with the single automatic retry on transient failures.
    async fn send_request(
        &self,
        tier: AnalyzerTier,
        snapshot: &ContentSnapshot,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let request_id = Uuid::new_v4();
        let url = self.endpoint(tier);

        let request = AnalyzeRequest {
            content: &snapshot.text,
            sensitivity: snapshot.sensitivity,
            discussion_id: snapshot.discussion_id.as_deref(),
            topic_id: snapshot.topic_id.as_deref(),
        };

        let mut last_error = None;

        for attempt in 1..=2u32 {
            match self.try_send(tier, url, &request).await {
                Ok(result) => {
                    info!(
                        tier = tier.name(),
                        %request_id,
                        attempt,
                        analysis_time_ms = result.analysis_time_ms,
                        feedback_count = result.feedback.len(),
                        "Analysis request successful"
                    );
                    return Ok(result);
                }
                Err(e) if attempt == 1 && e.is_transient() => {
                    warn!(
                        tier = tier.name(),
                        %request_id,
                        attempt,
                        error = %e,
                        "Analysis request failed, retrying..."
                    );
                    last_error = Some(e);
                    tokio::time::sleep(self.retry_backoff(tier)).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| AnalyzerError::Network("retries exhausted".into())))
    }

    /// Try to send a single request.
    async fn try_send(
        &self,
        tier: AnalyzerTier,
        url: &str,
        request: &AnalyzeRequest<'_>,
    ) -> Result<AnalysisResult, AnalyzerError> {
        debug!(tier = tier.name(), url, "Sending analysis request");

        let mut builder = self.client.post(url).json(request);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: AnalyzeResponse = response
                .json()
                .await
                .map_err(|e| AnalyzerError::Parse(e.to_string()))?;
            return Ok(body.into_result(tier));
        }

        match status.as_u16() {
            401 => {
                let message = response.text().await.unwrap_or_default();
                Err(AnalyzerError::Unauthorized(message))
            }
            400 => {
                let message = response.text().await.unwrap_or_default();
                Err(AnalyzerError::ValidationFailed(message))
            }
            429 => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse().ok());
                Err(AnalyzerError::RateLimited { retry_after_secs })
            }
            // The slow tier signals planned degradation with 503; the fast
            // tier has no such contract, so its 503 stays a retryable 5xx.
            503 if tier == AnalyzerTier::Slow => Err(AnalyzerError::ServiceUnavailable),
            code => {
                let message = response.text().await.unwrap_or_default();
                Err(AnalyzerError::RequestFailed {
                    status: code,
                    message,
                })
            }
        }
    }

    /// Check if the analyzer service is reachable.
    pub async fn health_check(&self) -> bool {
        match self.client.get(&self.config.health_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Analyzer for AnalyzerClient {
    async fn analyze(
        &self,
        tier: AnalyzerTier,
        snapshot: &ContentSnapshot,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let length = snapshot.text.chars().count();
        if length < self.config.min_content_length {
            return Err(AnalyzerError::ContentTooShort {
                length,
                min: self.config.min_content_length,
            });
        }

        self.send_request(tier, snapshot).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitivity::SensitivityLevel;

    fn snapshot(text: &str) -> ContentSnapshot {
        ContentSnapshot::new(text, SensitivityLevel::Medium, None, None)
    }

    #[test]
    fn test_client_config_from_defaults() {
        let config = AnalyzerClientConfig::default();
        assert!(config.fast_endpoint.ends_with("/feedback/preview"));
        assert!(config.slow_endpoint.ends_with("/feedback/preview/ai"));
        assert_eq!(config.fast_retry_backoff, Duration::from_millis(1_000));
        assert_eq!(config.slow_retry_backoff, Duration::from_millis(2_000));
        assert_eq!(config.min_content_length, 20);
    }

    #[test]
    fn test_transient_classification() {
        assert!(AnalyzerError::Network("refused".into()).is_transient());
        assert!(AnalyzerError::RequestFailed {
            status: 502,
            message: String::new()
        }
        .is_transient());
        assert!(!AnalyzerError::Unauthorized(String::new()).is_transient());
        assert!(!AnalyzerError::ValidationFailed(String::new()).is_transient());
        assert!(!AnalyzerError::RateLimited {
            retry_after_secs: Some(30)
        }
        .is_transient());
        assert!(!AnalyzerError::ServiceUnavailable.is_transient());
    }

    #[test]
    fn test_silent_degradation() {
        assert!(AnalyzerError::ServiceUnavailable.is_silent_degradation());
        assert!(!AnalyzerError::Network("down".into()).is_silent_degradation());
    }

    #[tokio::test]
    async fn test_short_content_rejected_locally() {
        let client = AnalyzerClient::new(AnalyzerClientConfig {
            // Unroutable endpoint: any network attempt would error differently.
            fast_endpoint: "http://192.0.2.1:1/feedback/preview".into(),
            ..AnalyzerClientConfig::default()
        });

        let err = client
            .analyze(AnalyzerTier::Fast, &snapshot("too short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::ContentTooShort { .. }));
    }

    #[test]
    fn test_rate_limited_display_includes_wait() {
        let err = AnalyzerError::RateLimited {
            retry_after_secs: Some(42),
        };
        assert!(err.to_string().contains("42 seconds"));
    }

    #[test]
    fn test_conversion_to_common_error() {
        let err: rhetor_common::Error = AnalyzerError::Unauthorized("bad token".into()).into();
        assert_eq!(err.status_code(), 401);

        let err: rhetor_common::Error = AnalyzerError::ServiceUnavailable.into();
        assert_eq!(err.status_code(), 503);
    }
}
