//! Trailing-edge debounce timers, one per analyzer tier.
//!
//! Both tiers watch the same input stream but settle on different quiet
//! periods. Each new input aborts and re-arms that tier's timer; only a
//! timer that survives its full quiet period fires, carrying the exact
//! snapshot it was armed with and a sequence number the coordinator uses
//! to reject fires from superseded arms.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::snapshot::ContentSnapshot;
use crate::types::AnalyzerTier;

/// Lifecycle of one tier between keystrokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TierPhase {
    /// No analyzable content, nothing armed.
    #[default]
    Idle,
    /// Quiet-period timer armed, waiting for typing to stop.
    Pending,
    /// Network request issued, awaiting a response.
    InFlight,
    /// Result or error recorded for the snapshot that was in flight.
    Settled,
}

impl TierPhase {
    /// Whether the caller should render this tier as busy.
    ///
    /// Pending counts: from the caller's perspective a new analysis is
    /// already owed the moment typing resumes.
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }
}

/// Message emitted when a quiet period elapses without further input.
#[derive(Debug)]
pub struct TimerFired {
    /// Tier whose timer fired.
    pub tier: AnalyzerTier,
    /// Snapshot the timer was armed with.
    pub snapshot: ContentSnapshot,
    /// Arm sequence number; stale fires carry an old one.
    pub seq: u64,
}

/// Trailing-edge debounce timer for one tier.
///
/// There is no leading-edge emission: the first input arms the timer, it
/// does not fire one.
pub struct DebounceScheduler {
    tier: AnalyzerTier,
    period: Duration,
    next_seq: u64,
    timer: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<TimerFired>,
}

impl DebounceScheduler {
    /// Create a scheduler emitting fires on the given channel.
    pub fn new(
        tier: AnalyzerTier,
        period: Duration,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        Self {
            tier,
            period,
            next_seq: 0,
            timer: None,
            tx,
        }
    }

    /// Restart the quiet-period timer with the latest snapshot.
    ///
    /// Returns the arm sequence number; a fire whose `seq` differs from the
    /// most recently returned value was superseded before it landed.
    pub fn schedule(&mut self, snapshot: ContentSnapshot) -> u64 {
        self.cancel();

        self.next_seq += 1;
        let seq = self.next_seq;
        let tier = self.tier;
        let period = self.period;
        let tx = self.tx.clone();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(period).await;
            let _ = tx.send(TimerFired {
                tier,
                snapshot,
                seq,
            });
        }));

        seq
    }

    /// Abort any armed timer without firing.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// The most recently issued arm sequence number.
    pub const fn current_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
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

    async fn settle() {
        // Let aborted/armed timer tasks run to their next await point.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_emission_before_quiet_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler =
            DebounceScheduler::new(AnalyzerTier::Fast, Duration::from_millis(400), tx);

        scheduler.schedule(snapshot("first revision of draft"));
        settle().await;
        tokio::time::advance(Duration::from_millis(399)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        let fired = rx.try_recv().expect("timer should have fired");
        assert_eq!(fired.tier, AnalyzerTier::Fast);
        assert_eq!(fired.snapshot.text, "first revision of draft");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_input_restarts_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler =
            DebounceScheduler::new(AnalyzerTier::Fast, Duration::from_millis(400), tx);

        scheduler.schedule(snapshot("first revision of draft"));
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;

        // Typing resumed: the old arm must never fire.
        let seq = scheduler.schedule(snapshot("second revision of draft"));
        settle().await;
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        let fired = rx.try_recv().expect("restarted timer should fire");
        assert_eq!(fired.snapshot.text, "second revision of draft");
        assert_eq!(fired.seq, seq);

        // Exactly one emission for the burst.
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler =
            DebounceScheduler::new(AnalyzerTier::Slow, Duration::from_millis(2_500), tx);

        scheduler.schedule(snapshot("a draft that gets deleted"));
        scheduler.cancel();

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_schedulers_do_not_interfere() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut fast = DebounceScheduler::new(AnalyzerTier::Fast, Duration::from_millis(400), tx.clone());
        let mut slow = DebounceScheduler::new(AnalyzerTier::Slow, Duration::from_millis(2_500), tx);

        let snap = snapshot("both tiers watch the same stream");
        fast.schedule(snap.clone());
        slow.schedule(snap);

        settle().await;
        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        let fired = rx.try_recv().expect("fast timer should fire first");
        assert_eq!(fired.tier, AnalyzerTier::Fast);
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2_100)).await;
        settle().await;
        let fired = rx.try_recv().expect("slow timer fires later");
        assert_eq!(fired.tier, AnalyzerTier::Slow);
    }

    #[test]
    fn test_phase_loading_classification() {
        assert!(!TierPhase::Idle.is_loading());
        assert!(TierPhase::Pending.is_loading());
        assert!(TierPhase::InFlight.is_loading());
        assert!(!TierPhase::Settled.is_loading());
    }
}
