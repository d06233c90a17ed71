//! Sensitivity levels and the confidence filter derived from them.

use serde::{Deserialize, Serialize};

use crate::types::FeedbackItem;

/// User-controlled sensitivity for which feedback is surfaced.
///
/// Maps to a confidence threshold; thresholds are strictly increasing so a
/// higher level always shows a subset of what a lower level shows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensitivityLevel {
    /// Show anything the analyzer is at least half-sure about.
    Low,
    /// Balanced default.
    #[default]
    Medium,
    /// Only high-confidence feedback.
    High,
}

impl SensitivityLevel {
    /// Minimum confidence a feedback item needs to be surfaced at this level.
    pub const fn threshold(self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 0.7,
            Self::High => 0.85,
        }
    }

    /// Get level name in wire/persisted form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parse a stored level, falling back to the default on anything
    /// unrecognized. Persisted preferences must never error out the caller.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retain feedback the analyzer wants displayed and that clears the
/// level's confidence threshold. Pure; the input order is preserved.
pub fn filter_feedback(items: &[FeedbackItem], level: SensitivityLevel) -> Vec<FeedbackItem> {
    items
        .iter()
        .filter(|item| item.should_display && item.confidence_score >= level.threshold())
        .cloned()
        .collect()
}
