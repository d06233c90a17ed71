//! Result cache with stale-while-revalidate semantics.
//!
//! Entries are keyed by snapshot identity plus tier. An entry is "fresh"
//! for a tier-specific window during which an identical snapshot is served
//! from cache without a network request, then "stale" until eviction,
//! during which it may still be displayed while a refetch is in flight.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use rhetor_common::TierConfig;

use crate::snapshot::CacheKey;
use crate::types::{AnalysisResult, AnalyzerTier};

/// Freshness and eviction windows for one tier.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Entries younger than this are served without refetching.
    pub fresh_for: Duration,
    /// Entries older than this are dropped entirely.
    pub evict_after: Duration,
}

impl CachePolicy {
    /// Derive the policy from a tier's configuration.
    pub fn from_tier(tier: &TierConfig) -> Self {
        Self {
            fresh_for: Duration::from_secs(tier.cache_fresh_secs),
            evict_after: Duration::from_secs(tier.cache_evict_secs),
        }
    }
}

/// Cached analyzer output.
struct CacheEntry {
    result: AnalysisResult,
    inserted_at: Instant,
}

/// A cache lookup that found something still usable.
#[derive(Debug, Clone)]
pub struct Cached {
    /// The stored result.
    pub result: AnalysisResult,
    /// Whether the entry is inside its freshness window. Stale entries may
    /// be displayed but must be revalidated.
    pub is_fresh: bool,
}

/// Shared result cache for both tiers.
///
/// The two tiers write disjoint keys, so a single map suffices.
pub struct ResultCache {
    fast_policy: CachePolicy,
    slow_policy: CachePolicy,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    /// Create a cache with per-tier policies.
    pub fn new(fast_policy: CachePolicy, slow_policy: CachePolicy) -> Self {
        Self {
            fast_policy,
            slow_policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    const fn policy(&self, tier: AnalyzerTier) -> CachePolicy {
        match tier {
            AnalyzerTier::Fast => self.fast_policy,
            AnalyzerTier::Slow => self.slow_policy,
        }
    }

    /// Look up a key, serving stale entries until their eviction deadline.
    pub async fn get(&self, key: &CacheKey) -> Option<Cached> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        let age = entry.inserted_at.elapsed();
        let policy = self.policy(key.tier);
        if age >= policy.evict_after {
            return None;
        }

        Some(Cached {
            result: entry.result.clone(),
            is_fresh: age < policy.fresh_for,
        })
    }

    /// Store a result, pruning anything past its eviction deadline.
    pub async fn put(&self, key: CacheKey, result: AnalysisResult) {
        let mut entries = self.entries.write().await;

        let fast = self.fast_policy;
        let slow = self.slow_policy;
        entries.retain(|k, entry| {
            let policy = match k.tier {
                AnalyzerTier::Fast => fast,
                AnalyzerTier::Slow => slow,
            };
            entry.inserted_at.elapsed() < policy.evict_after
        });

        debug!(
            tier = key.tier.name(),
            entries = entries.len() + 1,
            "Caching analysis result"
        );
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of live (non-evicted) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(k, entry)| entry.inserted_at.elapsed() < self.policy(k.tier).evict_after)
            .count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitivity::SensitivityLevel;
    use crate::snapshot::ContentSnapshot;

    fn test_cache() -> ResultCache {
        ResultCache::new(
            CachePolicy {
                fresh_for: Duration::from_secs(30),
                evict_after: Duration::from_secs(300),
            },
            CachePolicy {
                fresh_for: Duration::from_secs(120),
                evict_after: Duration::from_secs(600),
            },
        )
    }

    fn key(text: &str, tier: AnalyzerTier) -> CacheKey {
        CacheKey::new(
            ContentSnapshot::new(text, SensitivityLevel::Medium, None, None),
            tier,
        )
    }

    fn result(tier: AnalyzerTier) -> AnalysisResult {
        AnalysisResult {
            feedback: Vec::new(),
            primary: None,
            ready_to_post: true,
            summary: "Looks good.".into(),
            analysis_time_ms: 12,
            source: tier,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale_then_evicted() {
        let cache = test_cache();
        let k = key("a draft worth caching here", AnalyzerTier::Fast);
        cache.put(k.clone(), result(AnalyzerTier::Fast)).await;

        let hit = cache.get(&k).await.expect("fresh hit");
        assert!(hit.is_fresh);

        tokio::time::advance(Duration::from_secs(31)).await;
        let hit = cache.get(&k).await.expect("stale hit");
        assert!(!hit.is_fresh);

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(cache.get(&k).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tier_windows_are_longer() {
        let cache = test_cache();
        let k = key("a draft worth caching here", AnalyzerTier::Slow);
        cache.put(k.clone(), result(AnalyzerTier::Slow)).await;

        // Past the fast freshness window but inside the slow one.
        tokio::time::advance(Duration::from_secs(60)).await;
        let hit = cache.get(&k).await.expect("slow entry still fresh");
        assert!(hit.is_fresh);

        tokio::time::advance(Duration::from_secs(120)).await;
        let hit = cache.get(&k).await.expect("slow entry stale, not evicted");
        assert!(!hit.is_fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiers_use_disjoint_keys() {
        let cache = test_cache();
        let fast_key = key("the very same draft text", AnalyzerTier::Fast);
        let slow_key = key("the very same draft text", AnalyzerTier::Slow);

        cache.put(fast_key.clone(), result(AnalyzerTier::Fast)).await;
        assert!(cache.get(&fast_key).await.is_some());
        assert!(cache.get(&slow_key).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_prunes_expired_entries() {
        let cache = test_cache();
        let old = key("an old draft long forgotten", AnalyzerTier::Fast);
        cache.put(old.clone(), result(AnalyzerTier::Fast)).await;

        tokio::time::advance(Duration::from_secs(301)).await;
        let new = key("a brand new draft arrives", AnalyzerTier::Fast);
        cache.put(new.clone(), result(AnalyzerTier::Fast)).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&old).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_sensitivity_is_a_different_key() {
        let cache = test_cache();
        let medium = CacheKey::new(
            ContentSnapshot::new(
                "identical text different level",
                SensitivityLevel::Medium,
                None,
                None,
            ),
            AnalyzerTier::Fast,
        );
        let low = CacheKey::new(
            ContentSnapshot::new(
                "identical text different level",
                SensitivityLevel::Low,
                None,
                None,
            ),
            AnalyzerTier::Fast,
        );

        cache.put(medium.clone(), result(AnalyzerTier::Fast)).await;
        assert!(cache.get(&medium).await.is_some());
        assert!(cache.get(&low).await.is_none());
    }
}
