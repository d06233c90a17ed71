//! Content snapshots and their identity.
//!
//! Every analysis request is tagged with the snapshot it was issued for.
//! Identity comparison on completion is what makes late, superseded
//! responses droppable without any true request cancellation.

use crate::sensitivity::SensitivityLevel;
use crate::types::AnalyzerTier;

/// Default minimum content length (in characters) before analysis applies.
pub const MIN_CONTENT_LENGTH: usize = 20;

/// The exact inputs one analysis request was issued for.
///
/// Immutable once created; identity is the full tuple, so a change to the
/// text, the sensitivity level, or the discussion context produces a new
/// identity and logically cancels anything in flight for the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentSnapshot {
    /// Draft text at the moment of capture.
    pub text: String,

    /// Sensitivity level active at the moment of capture.
    pub sensitivity: SensitivityLevel,

    /// Discussion the draft replies to, if any.
    pub discussion_id: Option<String>,

    /// Topic the draft belongs to, if any.
    pub topic_id: Option<String>,
}

impl ContentSnapshot {
    /// Capture a snapshot of the current editor inputs.
    pub fn new(
        text: impl Into<String>,
        sensitivity: SensitivityLevel,
        discussion_id: Option<String>,
        topic_id: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            sensitivity,
            discussion_id,
            topic_id,
        }
    }

    /// Whether the text is long enough to analyze.
    ///
    /// Counted in characters, not bytes: the rule is user-visible.
    pub fn meets_minimum_length(&self, min_chars: usize) -> bool {
        self.text.chars().count() >= min_chars
    }

    /// Whether another snapshot shares this one's filter semantics
    /// (sensitivity and discussion context), regardless of text.
    ///
    /// Results from such a snapshot may keep being displayed while a newer
    /// text revision is still being analyzed; results filtered under
    /// different semantics may not.
    pub fn same_filter_context(&self, other: &Self) -> bool {
        self.sensitivity == other.sensitivity
            && self.discussion_id == other.discussion_id
            && self.topic_id == other.topic_id
    }
}

/// Cache key: snapshot identity plus the tier that produced the entry.
///
/// The two tiers write disjoint keys, so there are no cross-tier conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub snapshot: ContentSnapshot,
    pub tier: AnalyzerTier,
}

impl CacheKey {
    pub fn new(snapshot: ContentSnapshot, tier: AnalyzerTier) -> Self {
        Self { snapshot, tier }
    }
}
