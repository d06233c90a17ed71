//! Rhetor Feedback - hybrid dual-latency argument feedback coordinator.
//!
//! Gives a user writing a reply live feedback on argument quality while
//! they type. Two analyzer tiers sit behind HTTP endpoints: a fast
//! heuristic tier and a slow AI tier. This crate coordinates them:
//! - debounces keystrokes on two schedules, one per tier
//! - issues and retries analyzer requests
//! - caches results by snapshot identity with stale-while-revalidate
//! - merges the tiers with slow-over-fast precedence and no flicker
//! - applies the user's sensitivity filter
//! - derives a single "ready to post" signal that fails open
//! - persists the sensitivity preference across sessions

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod debounce;
pub mod merge;
pub mod prefs;
pub mod readiness;
pub mod sensitivity;
pub mod snapshot;
pub mod types;

pub use cache::{CachePolicy, Cached, ResultCache};
pub use client::{Analyzer, AnalyzerClient, AnalyzerClientConfig, AnalyzerError};
pub use coordinator::FeedbackCoordinator;
pub use debounce::{DebounceScheduler, TierPhase, TimerFired};
pub use merge::MergedView;
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use readiness::Readiness;
pub use sensitivity::{filter_feedback, SensitivityLevel};
pub use snapshot::{CacheKey, ContentSnapshot, MIN_CONTENT_LENGTH};
pub use types::{AnalysisResult, AnalyzerTier, FeedbackItem, FeedbackType};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::client::{Analyzer, AnalyzerClient, AnalyzerError};
    pub use crate::coordinator::FeedbackCoordinator;
    pub use crate::merge::MergedView;
    pub use crate::prefs::{FilePreferenceStore, PreferenceStore};
    pub use crate::sensitivity::SensitivityLevel;
    pub use crate::types::{AnalysisResult, AnalyzerTier, FeedbackItem, FeedbackType};
}
