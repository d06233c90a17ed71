//! The hybrid dual-latency feedback coordinator.
//!
//! Owns the two debounce schedulers, the analyzer client, the result
//! cache, and the preference store, and folds their outputs into one
//! `MergedView`. Every keystroke restarts both quiet-period timers; every
//! completion is validated against the current snapshot identity before it
//! is applied, so late responses for superseded text are dropped silently
//! instead of overwriting newer results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rhetor_common::Config;

use crate::cache::{CachePolicy, ResultCache};
use crate::client::{Analyzer, AnalyzerClient, AnalyzerClientConfig, AnalyzerError};
use crate::debounce::{DebounceScheduler, TierPhase, TimerFired};
use crate::merge::{self, MergedView, TierOutcome};
use crate::prefs::PreferenceStore;
use crate::sensitivity::SensitivityLevel;
use crate::snapshot::{CacheKey, ContentSnapshot};
use crate::types::{AnalysisResult, AnalyzerTier};

/// Per-tier pipeline state.
struct TierSlot {
    scheduler: DebounceScheduler,
    phase: TierPhase,
    /// Arm sequence of the cycle currently owning this tier.
    active_seq: u64,
    /// Most recently settled result and the snapshot it belongs to.
    settled: Option<(ContentSnapshot, AnalysisResult)>,
    error: Option<AnalyzerError>,
}

impl TierSlot {
    fn new(scheduler: DebounceScheduler) -> Self {
        Self {
            scheduler,
            phase: TierPhase::Idle,
            active_seq: 0,
            settled: None,
            error: None,
        }
    }
}

/// Mutable coordinator state, guarded by one mutex.
struct State {
    text: String,
    sensitivity: SensitivityLevel,
    discussion_id: Option<String>,
    topic_id: Option<String>,
    /// Identity of the snapshot all in-flight work is validated against.
    current: Option<ContentSnapshot>,
    fast: TierSlot,
    slow: TierSlot,
}

impl State {
    fn slot(&self, tier: AnalyzerTier) -> &TierSlot {
        match tier {
            AnalyzerTier::Fast => &self.fast,
            AnalyzerTier::Slow => &self.slow,
        }
    }

    fn slot_mut(&mut self, tier: AnalyzerTier) -> &mut TierSlot {
        match tier {
            AnalyzerTier::Fast => &mut self.fast,
            AnalyzerTier::Slow => &mut self.slow,
        }
    }
}

struct Inner {
    analyzer: Arc<dyn Analyzer>,
    cache: ResultCache,
    prefs: Arc<dyn PreferenceStore>,
    min_content_length: usize,
    state: Mutex<State>,
    view_tx: watch::Sender<MergedView>,
}

/// Live feedback coordinator for one draft editor.
///
/// Must be created inside a tokio runtime; dropping it stops all timers
/// and the internal event loop.
pub struct FeedbackCoordinator {
    inner: Arc<Inner>,
    view_rx: watch::Receiver<MergedView>,
    pump: JoinHandle<()>,
}

impl FeedbackCoordinator {
    /// Create a coordinator backed by the real analyzer HTTP client.
    pub fn new(config: &Config, prefs: Arc<dyn PreferenceStore>) -> Self {
        let client = AnalyzerClient::new(AnalyzerClientConfig::from_config(config));
        Self::with_analyzer(config, Arc::new(client), prefs)
    }

    /// Create a coordinator with an injected analyzer backend.
    pub fn with_analyzer(
        config: &Config,
        analyzer: Arc<dyn Analyzer>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        let sensitivity = prefs.load();
        info!(%sensitivity, "Feedback coordinator starting");

        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let fast_scheduler = DebounceScheduler::new(
            AnalyzerTier::Fast,
            Duration::from_millis(config.feedback.fast.debounce_ms),
            fire_tx.clone(),
        );
        let slow_scheduler = DebounceScheduler::new(
            AnalyzerTier::Slow,
            Duration::from_millis(config.feedback.slow.debounce_ms),
            fire_tx,
        );

        let cache = ResultCache::new(
            CachePolicy::from_tier(&config.feedback.fast),
            CachePolicy::from_tier(&config.feedback.slow),
        );

        let (view_tx, view_rx) = watch::channel(MergedView::default());

        let inner = Arc::new(Inner {
            analyzer,
            cache,
            prefs,
            min_content_length: config.feedback.min_content_length,
            state: Mutex::new(State {
                text: String::new(),
                sensitivity,
                discussion_id: None,
                topic_id: None,
                current: None,
                fast: TierSlot::new(fast_scheduler),
                slow: TierSlot::new(slow_scheduler),
            }),
            view_tx,
        });

        let pump = tokio::spawn(Inner::pump(Arc::clone(&inner), fire_rx));

        Self {
            inner,
            view_rx,
            pump,
        }
    }

    /// Feed the latest editor text. Restarts both debounce timers.
    pub async fn update_content(&self, text: impl Into<String>) {
        let mut state = self.inner.state.lock().await;
        state.text = text.into();
        self.inner.rekey(&mut state).await;
    }

    /// Change the sensitivity level, persisting it and re-keying analysis.
    ///
    /// The level takes effect for this session even when persistence
    /// fails; the error only reports that it will not survive a restart.
    pub async fn set_sensitivity(&self, level: SensitivityLevel) -> rhetor_common::Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.sensitivity == level {
            return Ok(());
        }
        state.sensitivity = level;
        self.inner.rekey(&mut state).await;
        drop(state);

        self.inner.prefs.save(level)
    }

    /// Change the discussion/topic context, re-keying analysis.
    pub async fn set_context(&self, discussion_id: Option<String>, topic_id: Option<String>) {
        let mut state = self.inner.state.lock().await;
        if state.discussion_id == discussion_id && state.topic_id == topic_id {
            return;
        }
        state.discussion_id = discussion_id;
        state.topic_id = topic_id;
        self.inner.rekey(&mut state).await;
    }

    /// The active sensitivity level.
    pub async fn sensitivity(&self) -> SensitivityLevel {
        self.inner.state.lock().await.sensitivity
    }

    /// The current merged view.
    pub fn view(&self) -> MergedView {
        self.view_rx.borrow().clone()
    }

    /// Subscribe to merged view changes.
    pub fn subscribe(&self) -> watch::Receiver<MergedView> {
        self.view_rx.clone()
    }
}

impl Drop for FeedbackCoordinator {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl Inner {
    /// Event loop draining debounce fires.
    async fn pump(inner: Arc<Self>, mut rx: mpsc::UnboundedReceiver<TimerFired>) {
        while let Some(fired) = rx.recv().await {
            Self::handle_timer_fire(&inner, fired).await;
        }
    }

    /// Rebuild the current snapshot after any input change and restart the
    /// per-tier pipelines for it.
    async fn rekey(&self, state: &mut State) {
        let snapshot = ContentSnapshot::new(
            state.text.clone(),
            state.sensitivity,
            state.discussion_id.clone(),
            state.topic_id.clone(),
        );

        if !snapshot.meets_minimum_length(self.min_content_length) {
            // Neither tier applies: not loading, no error, posting open.
            state.current = None;
            for tier in [AnalyzerTier::Fast, AnalyzerTier::Slow] {
                let slot = state.slot_mut(tier);
                slot.scheduler.cancel();
                slot.phase = TierPhase::Idle;
                slot.error = None;
            }
            debug!(
                chars = snapshot.text.chars().count(),
                min = self.min_content_length,
                "Content below minimum length, analysis idle"
            );
            self.publish(state);
            return;
        }

        state.current = Some(snapshot.clone());

        for tier in [AnalyzerTier::Fast, AnalyzerTier::Slow] {
            let key = CacheKey::new(snapshot.clone(), tier);
            let cached = self.cache.get(&key).await;

            let slot = state.slot_mut(tier);
            slot.error = None;

            // A fresh cached result settles the tier with no timer and no
            // network request at all.
            if let Some(cached) = cached {
                if cached.is_fresh {
                    debug!(tier = tier.name(), "Fresh cache hit, skipping request");
                    slot.scheduler.cancel();
                    slot.phase = TierPhase::Settled;
                    slot.active_seq = slot.scheduler.current_seq();
                    slot.settled = Some((snapshot.clone(), cached.result));
                    continue;
                }
            }

            slot.phase = TierPhase::Pending;
            slot.active_seq = slot.scheduler.schedule(snapshot.clone());
        }

        self.publish(state);
    }

    /// A quiet period elapsed; issue the request if the fire still matches
    /// the current snapshot.
    async fn handle_timer_fire(inner: &Arc<Self>, fired: TimerFired) {
        let TimerFired {
            tier,
            snapshot,
            seq,
        } = fired;

        let mut state = inner.state.lock().await;

        if state.slot(tier).active_seq != seq {
            debug!(tier = tier.name(), "Ignoring fire from superseded timer");
            return;
        }
        let Some(current) = state.current.clone() else {
            return;
        };
        if current != snapshot {
            debug!(tier = tier.name(), "Ignoring fire for superseded snapshot");
            return;
        }

        // A fresh entry may have appeared since the timer was armed.
        let key = CacheKey::new(snapshot.clone(), tier);
        if let Some(cached) = inner.cache.get(&key).await {
            if cached.is_fresh {
                let slot = state.slot_mut(tier);
                slot.phase = TierPhase::Settled;
                slot.settled = Some((snapshot, cached.result));
                slot.error = None;
                inner.publish(&state);
                return;
            }
        }

        state.slot_mut(tier).phase = TierPhase::InFlight;
        inner.publish(&state);
        drop(state);

        info!(
            tier = tier.name(),
            chars = snapshot.text.chars().count(),
            "Debounce settled, issuing analysis request"
        );

        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            let outcome = task_inner.analyzer.analyze(tier, &snapshot).await;
            task_inner
                .handle_completion(tier, snapshot, seq, outcome)
                .await;
        });
    }

    /// Apply one request outcome, dropping it if the snapshot was
    /// superseded while the request was in flight.
    async fn handle_completion(
        &self,
        tier: AnalyzerTier,
        snapshot: ContentSnapshot,
        seq: u64,
        outcome: Result<AnalysisResult, AnalyzerError>,
    ) {
        match outcome {
            Ok(result) => {
                // Cache under the snapshot's own key either way; a
                // superseded result is still valid for identical re-entry.
                self.cache
                    .put(CacheKey::new(snapshot.clone(), tier), result.clone())
                    .await;

                let mut state = self.state.lock().await;
                let is_current = state.current.as_ref() == Some(&snapshot);
                let slot = state.slot_mut(tier);

                if is_current {
                    slot.phase = TierPhase::Settled;
                    slot.settled = Some((snapshot, result));
                    slot.error = None;
                } else {
                    debug!(
                        tier = tier.name(),
                        "Dropping response for superseded snapshot"
                    );
                    if slot.active_seq == seq && slot.phase == TierPhase::InFlight {
                        slot.phase = TierPhase::Idle;
                    }
                }
                self.publish(&state);
            }
            Err(e) => {
                let mut state = self.state.lock().await;
                let is_current = state.current.as_ref() == Some(&snapshot);
                let slot = state.slot_mut(tier);

                if !is_current || slot.active_seq != seq {
                    debug!(
                        tier = tier.name(),
                        error = %e,
                        "Dropping error for superseded snapshot"
                    );
                    if slot.active_seq == seq && slot.phase == TierPhase::InFlight {
                        slot.phase = TierPhase::Idle;
                    }
                    self.publish(&state);
                    return;
                }

                slot.phase = TierPhase::Settled;
                if e.is_silent_degradation() {
                    info!(
                        tier = tier.name(),
                        "Slow tier degraded, continuing with fast tier only"
                    );
                    slot.error = None;
                } else {
                    warn!(tier = tier.name(), error = %e, "Analysis request failed");
                    slot.error = Some(e);
                }
                self.publish(&state);
            }
        }
    }

    /// Recompute and publish the merged view.
    fn publish(&self, state: &State) {
        let current = state.current.as_ref();
        let view = merge::resolve(
            tier_outcome(&state.fast, current),
            tier_outcome(&state.slow, current),
            state.sensitivity,
            current.is_some(),
        );
        self.view_tx.send_replace(view);
    }
}

/// Project one tier slot onto the merge inputs.
fn tier_outcome<'a>(slot: &'a TierSlot, current: Option<&ContentSnapshot>) -> TierOutcome<'a> {
    let (current_result, previous_result) = match &slot.settled {
        Some((snapshot, result)) if Some(snapshot) == current => (Some(result), None),
        Some((snapshot, result)) => match current {
            // Display continuity applies only while the filter semantics
            // (sensitivity and context) are unchanged; a re-keyed filter
            // must not show results produced under the old one.
            Some(c) if snapshot.same_filter_context(c) => (None, Some(result)),
            _ => (None, None),
        },
        None => (None, None),
    };

    TierOutcome {
        current: current_result,
        previous: previous_result,
        loading: slot.phase.is_loading(),
        error: slot.error.as_ref().map(|e| e.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
