//! Error types for the Rhetor ecosystem.

use thiserror::Error;

/// Result type alias using the Rhetor error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Rhetor services.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Downstream analyzer temporarily degraded
    #[error("Service degraded: {0}")]
    Degraded(String),

    /// External service error
    #[error("External service error: {0}")]
    External(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is an authentication error.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this is a rate limit error.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Check if the caller should keep going with partial results.
    ///
    /// Degraded and rate-limit conditions are recoverable from the caller's
    /// perspective: the other analyzer tier may still be serving.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_) | Self::RateLimited(_))
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Auth(_) => 401,
            Self::InvalidInput(_) => 400,
            Self::RateLimited(_) => 429,
            Self::Degraded(_) => 503,
            Self::Timeout => 408,
            Self::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::Auth("test".into()).status_code(), 401);
        assert_eq!(Error::InvalidInput("test".into()).status_code(), 400);
        assert_eq!(Error::RateLimited("test".into()).status_code(), 429);
        assert_eq!(Error::Degraded("test".into()).status_code(), 503);
        assert_eq!(Error::Internal("test".into()).status_code(), 500);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::External("analyzer unreachable".into());
        let with_ctx = err.with_context("fast tier");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(with_ctx.status_code(), 500);
    }

    #[test]
    fn test_is_degraded() {
        assert!(Error::Degraded("ai tier down".into()).is_degraded());
        assert!(Error::RateLimited("slow down".into()).is_degraded());
        assert!(!Error::Auth("bad token".into()).is_degraded());
    }
}
