//! Types for analyzer integration.
//!
//! Defines request/response structures for communicating with the two
//! analyzer endpoints, as well as the normalized result the coordinator
//! works with.

use serde::{Deserialize, Serialize};

/// Which analyzer pipeline produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalyzerTier {
    /// Heuristic/regex analyzer. Sub-second latency, lower precision.
    Fast,
    /// AI analyzer. 2-5s latency, higher precision.
    Slow,
}

impl AnalyzerTier {
    /// Get tier name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }
}

/// Category of one piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedbackType {
    /// Logical fallacy detected in the argument.
    Fallacy,
    /// Inflammatory or hostile tone.
    Inflammatory,
    /// Factual claim without a source.
    Unsourced,
    /// One-sided framing or loaded language.
    Bias,
    /// Positive reinforcement for a well-constructed argument.
    Affirmation,
}

/// One piece of feedback produced by an analyzer.
///
/// The coordinator never mutates these beyond re-deriving display
/// eligibility; everything else is the analyzer's verbatim output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    /// Feedback category.
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,

    /// Analyzer-specific refinement, e.g. "ad_hominem" under FALLACY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Actionable suggestion shown to the writer.
    pub suggestion_text: String,

    /// Why the analyzer flagged this.
    pub reasoning: String,

    /// Analyzer confidence in the range [0, 1].
    pub confidence_score: f64,

    /// Optional links/explainers about the flagged pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_resources: Option<serde_json::Value>,

    /// Whether the analyzer itself considers this worth surfacing.
    pub should_display: bool,
}

/// Wire request body shared by both analyzer endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest<'a> {
    /// Draft text to analyze.
    pub content: &'a str,

    /// Active sensitivity level.
    pub sensitivity: crate::sensitivity::SensitivityLevel,

    /// Discussion the draft replies to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_id: Option<&'a str>,

    /// Topic the draft belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<&'a str>,
}

/// Wire response body shared by both analyzer endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// All feedback produced for the draft.
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,

    /// The single most important item, as chosen by the analyzer.
    #[serde(default)]
    pub primary: Option<FeedbackItem>,

    /// Whether the analyzer considers the draft fine to post as-is.
    pub ready_to_post: bool,

    /// Human-readable one-line assessment.
    #[serde(default)]
    pub summary: String,

    /// Server-side analysis latency in milliseconds.
    #[serde(default)]
    pub analysis_time_ms: u64,
}

impl AnalyzeResponse {
    /// Attach the producing tier, yielding the normalized result.
    pub fn into_result(self, source: AnalyzerTier) -> AnalysisResult {
        AnalysisResult {
            feedback: self.feedback,
            primary: self.primary,
            ready_to_post: self.ready_to_post,
            summary: self.summary,
            analysis_time_ms: self.analysis_time_ms,
            source,
        }
    }
}

/// Normalized analyzer output, one per completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// All feedback produced for the draft.
    pub feedback: Vec<FeedbackItem>,

    /// The single most important item, as chosen by the analyzer.
    pub primary: Option<FeedbackItem>,

    /// Whether the analyzer considers the draft fine to post as-is.
    pub ready_to_post: bool,

    /// Human-readable one-line assessment.
    pub summary: String,

    /// Server-side analysis latency in milliseconds.
    pub analysis_time_ms: u64,

    /// Which tier produced this result.
    pub source: AnalyzerTier,
}
