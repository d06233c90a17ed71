//! Merge/precedence resolution across the two analyzer tiers.
//!
//! The resolver is a pure function from the per-tier outcomes to the
//! externally observable `MergedView`. Precedence: a slow (AI) result for
//! the current snapshot is authoritative; otherwise the fast result is
//! used; otherwise the view stays optimistic. Results that survive only
//! from a superseded snapshot may keep being displayed for continuity, but
//! never decide readiness.

use serde::Serialize;

use crate::readiness::{self, Readiness};
use crate::sensitivity::{filter_feedback, SensitivityLevel};
use crate::types::{AnalysisResult, FeedbackItem};

/// Message shown when analysis is down entirely. Posting stays allowed.
pub const ANALYSIS_UNAVAILABLE_MSG: &str =
    "Unable to analyze your draft right now — you can still post.";

/// The externally observable coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedView {
    /// Feedback items that passed the sensitivity filter.
    pub feedback: Vec<FeedbackItem>,

    /// The analyzer-chosen most important item.
    pub primary: Option<FeedbackItem>,

    /// Whether posting should be allowed right now.
    pub ready_to_post: bool,

    /// Human-readable assessment from the authoritative analyzer.
    pub summary: String,

    /// Whether the fast tier is armed or in flight.
    pub is_fast_loading: bool,

    /// Whether the slow tier is armed or in flight.
    pub is_slow_loading: bool,

    /// Whether the displayed feedback came from the AI tier.
    pub is_ai_feedback: bool,

    /// Whether the content is long enough to analyze at all.
    pub is_content_valid: bool,

    /// User-facing error, if any. Never blocks posting.
    pub error: Option<String>,
}

impl Default for MergedView {
    fn default() -> Self {
        Self {
            feedback: Vec::new(),
            primary: None,
            ready_to_post: true,
            summary: String::new(),
            is_fast_loading: false,
            is_slow_loading: false,
            is_ai_feedback: false,
            is_content_valid: false,
            error: None,
        }
    }
}

/// One tier's contribution to the merge.
#[derive(Debug, Default)]
pub struct TierOutcome<'a> {
    /// Settled result for the *current* snapshot, if any.
    pub current: Option<&'a AnalysisResult>,

    /// Settled result for a superseded snapshot with the same filter
    /// semantics; display continuity only.
    pub previous: Option<&'a AnalysisResult>,

    /// Whether this tier is armed or in flight.
    pub loading: bool,

    /// Rendered error, silent degradations already removed.
    pub error: Option<String>,
}

/// Resolve the two tier outcomes into one coherent view.
pub fn resolve(
    fast: TierOutcome<'_>,
    slow: TierOutcome<'_>,
    level: SensitivityLevel,
    content_valid: bool,
) -> MergedView {
    if !content_valid {
        // Too short to analyze: nothing pending, nothing blocking.
        return MergedView::default();
    }

    // Slow-over-fast precedence, current results before display-continuity
    // leftovers. `authoritative` decides readiness only when current.
    let (displayed, is_ai, is_current) = match (slow.current, fast.current) {
        (Some(result), _) => (Some(result), true, true),
        (None, Some(result)) => (Some(result), false, true),
        (None, None) => match (slow.previous, fast.previous) {
            (Some(result), _) => (Some(result), true, false),
            (None, Some(result)) => (Some(result), false, false),
            (None, None) => (None, false, false),
        },
    };

    let feedback = displayed
        .map(|result| filter_feedback(&result.feedback, level))
        .unwrap_or_default();
    let primary = displayed.and_then(|result| result.primary.clone());

    let Readiness {
        mut ready_to_post,
        summary,
    } = readiness::evaluate(&feedback, displayed);
    if !is_current {
        // A superseded snapshot's verdict never blocks the newer text.
        ready_to_post = true;
    }

    let any_loading = fast.loading || slow.loading;
    let error_detail = slow.error.or(fast.error);
    let error = match (displayed.is_some(), any_loading, error_detail) {
        (_, _, None) => None,
        // Results are still on screen; the failure is informational.
        (true, _, Some(detail)) => Some(detail),
        // The other tier may still deliver; stay quiet until it settles.
        (false, true, Some(_)) => None,
        (false, false, Some(detail)) => {
            Some(format!("{ANALYSIS_UNAVAILABLE_MSG} ({detail})"))
        }
    };

    MergedView {
        feedback,
        primary,
        ready_to_post,
        summary,
        is_fast_loading: fast.loading,
        is_slow_loading: slow.loading,
        is_ai_feedback: is_ai,
        is_content_valid: true,
        error,
    }
}

// ============================================================================
// Tests
// ============================================================================
