//! Derives the "ready to post" signal from the merged, filtered feedback.

use crate::types::{AnalysisResult, FeedbackItem};

/// The readiness verdict for the current draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// Whether posting should be allowed right now.
    pub ready_to_post: bool,
    /// Human-readable assessment, empty when no analyzer has spoken.
    pub summary: String,
}

impl Readiness {
    /// The optimistic default: posting is never blocked solely because
    /// analysis has not completed (or has failed).
    pub fn open() -> Self {
        Self {
            ready_to_post: true,
            summary: String::new(),
        }
    }
}

/// Evaluate readiness for the filtered feedback set.
///
/// Which feedback types block posting is the analyzer's policy, not ours:
/// the authoritative result's own `ready_to_post` and `summary` are used
/// verbatim. Without an authoritative result the verdict is open.
pub fn evaluate(_filtered: &[FeedbackItem], authoritative: Option<&AnalysisResult>) -> Readiness {
    match authoritative {
        Some(result) => Readiness {
            ready_to_post: result.ready_to_post,
            summary: result.summary.clone(),
        },
        None => Readiness::open(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalyzerTier, FeedbackType};

    fn result(ready: bool, summary: &str) -> AnalysisResult {
        AnalysisResult {
            feedback: Vec::new(),
            primary: None,
            ready_to_post: ready,
            summary: summary.into(),
            analysis_time_ms: 5,
            source: AnalyzerTier::Fast,
        }
    }

    #[test]
    fn test_no_result_defaults_open() {
        let verdict = evaluate(&[], None);
        assert!(verdict.ready_to_post);
        assert_eq!(verdict.summary, "");
    }

    #[test]
    fn test_analyzer_verdict_trusted_verbatim() {
        let blocked = result(false, "Personal attack detected.");
        let verdict = evaluate(&[], Some(&blocked));
        assert!(!verdict.ready_to_post);
        assert_eq!(verdict.summary, "Personal attack detected.");
    }

    #[test]
    fn test_verdict_independent_of_filtered_set() {
        // Even if every item is filtered out, the analyzer's own signal
        // stands; the blocking policy is not recomputed locally.
        let item = FeedbackItem {
            feedback_type: FeedbackType::Inflammatory,
            subtype: None,
            suggestion_text: "Tone it down.".into(),
            reasoning: "hostile phrasing".into(),
            confidence_score: 0.9,
            educational_resources: None,
            should_display: true,
        };
        let blocked = result(false, "Hostile tone.");

        let with_items = evaluate(std::slice::from_ref(&item), Some(&blocked));
        let without_items = evaluate(&[], Some(&blocked));
        assert_eq!(with_items, without_items);
    }
}
