//! Run statistics shared across concurrent resolution tasks.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cascade::{ResolutionOutcome, ResolutionStatus, StrategyKind};

/// Statistics from one resolution run.
///
/// Tracks processed, succeeded, and failed counts plus a per-strategy
/// success breakdown. Uses atomic counters for thread-safe updates from
/// concurrent resolution tasks.
#[derive(Debug, Default)]
pub struct RunStats {
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    not_found: AtomicUsize,
    invalid: AtomicUsize,
    errored: AtomicUsize,
    pair_errors: AtomicUsize,
    cache_hits: AtomicUsize,
    strategy_successes: [AtomicUsize; StrategyKind::COUNT],
}

impl RunStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished name.
    pub fn record(&self, outcome: &ResolutionOutcome) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        match outcome.status {
            ResolutionStatus::Success => {
                self.succeeded.fetch_add(1, Ordering::SeqCst);
                // Only winning strategies enter the breakdown
                if let Some(strategy) = outcome.strategy {
                    if strategy == StrategyKind::Cached {
                        self.cache_hits.fetch_add(1, Ordering::SeqCst);
                    }
                    self.strategy_successes[strategy.index()].fetch_add(1, Ordering::SeqCst);
                }
            }
            ResolutionStatus::NotFound => {
                self.not_found.fetch_add(1, Ordering::SeqCst);
            }
            ResolutionStatus::Invalid => {
                self.invalid.fetch_add(1, Ordering::SeqCst);
            }
            ResolutionStatus::Error => {
                self.errored.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.pair_errors
            .fetch_add(outcome.pair_errors as usize, Ordering::SeqCst);
    }

    /// Returns the number of names processed so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Returns the number of names resolved to a SMILES string.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Returns the number of names the full cascade could not resolve.
    #[must_use]
    pub fn not_found(&self) -> usize {
        self.not_found.load(Ordering::SeqCst)
    }

    /// Returns the number of names rejected before any backend traffic.
    #[must_use]
    pub fn invalid(&self) -> usize {
        self.invalid.load(Ordering::SeqCst)
    }

    /// Returns the number of names that failed outside the cascade itself.
    #[must_use]
    pub fn errored(&self) -> usize {
        self.errored.load(Ordering::SeqCst)
    }

    /// Returns the number of strategy/variant pairs that errored out.
    #[must_use]
    pub fn pair_errors(&self) -> usize {
        self.pair_errors.load(Ordering::SeqCst)
    }

    /// Returns the number of names answered straight from the cache.
    #[must_use]
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::SeqCst)
    }

    /// Returns the success count attributed to one strategy.
    #[must_use]
    pub fn successes_for(&self, strategy: StrategyKind) -> usize {
        self.strategy_successes[strategy.index()].load(Ordering::SeqCst)
    }

    /// Takes a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed(),
            succeeded: self.succeeded(),
            not_found: self.not_found(),
            invalid: self.invalid(),
            errored: self.errored(),
            pair_errors: self.pair_errors(),
            cache_hits: self.cache_hits(),
            strategy_successes: std::array::from_fn(|i| {
                self.strategy_successes[i].load(Ordering::SeqCst)
            }),
        }
    }
}

/// A point-in-time copy of [`RunStats`], safe to move across tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Names processed so far.
    pub processed: usize,
    /// Names resolved to a SMILES string.
    pub succeeded: usize,
    /// Names the full cascade could not resolve.
    pub not_found: usize,
    /// Names rejected before any backend traffic.
    pub invalid: usize,
    /// Names that failed outside the cascade itself.
    pub errored: usize,
    /// Strategy/variant pairs that errored out.
    pub pair_errors: usize,
    /// Names answered straight from the cache.
    pub cache_hits: usize,
    /// Success counts indexed by [`StrategyKind::index`].
    pub strategy_successes: [usize; StrategyKind::COUNT],
}

impl StatsSnapshot {
    /// Returns the success count attributed to one strategy.
    #[must_use]
    pub fn successes_for(&self, strategy: StrategyKind) -> usize {
        self.strategy_successes[strategy.index()]
    }

    /// Returns the success rate over processed names, 0.0 when nothing ran.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.processed as f64
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cascade::ResolutionOutcome;

    fn success(name: &str, strategy: StrategyKind) -> ResolutionOutcome {
        ResolutionOutcome {
            name: name.to_string(),
            smiles: Some("CCO".to_string()),
            strategy: Some(strategy),
            status: ResolutionStatus::Success,
            pair_errors: 0,
        }
    }

    #[test]
    fn test_run_stats_default_is_zero() {
        let stats = RunStats::new();
        assert_eq!(stats.processed(), 0);
        assert_eq!(stats.succeeded(), 0);
        assert_eq!(stats.not_found(), 0);
        assert_eq!(stats.invalid(), 0);
        assert_eq!(stats.errored(), 0);
        assert_eq!(stats.pair_errors(), 0);
        assert_eq!(stats.cache_hits(), 0);
    }

    #[test]
    fn test_run_stats_records_by_status() {
        let stats = RunStats::new();

        stats.record(&success("curcumin", StrategyKind::DirectName));
        stats.record(&ResolutionOutcome {
            name: "unobtainium".to_string(),
            smiles: None,
            strategy: None,
            status: ResolutionStatus::NotFound,
            pair_errors: 2,
        });
        stats.record(&ResolutionOutcome {
            name: "??".to_string(),
            smiles: None,
            strategy: None,
            status: ResolutionStatus::Invalid,
            pair_errors: 0,
        });
        stats.record(&ResolutionOutcome::error("broken"));

        assert_eq!(stats.processed(), 4);
        assert_eq!(stats.succeeded(), 1);
        assert_eq!(stats.not_found(), 1);
        assert_eq!(stats.invalid(), 1);
        assert_eq!(stats.errored(), 1);
        assert_eq!(stats.pair_errors(), 2);
    }

    #[test]
    fn test_run_stats_strategy_breakdown() {
        let stats = RunStats::new();

        stats.record(&success("a", StrategyKind::DirectName));
        stats.record(&success("b", StrategyKind::DirectName));
        stats.record(&success("c", StrategyKind::SynonymChase));
        stats.record(&success("a", StrategyKind::Cached));

        assert_eq!(stats.successes_for(StrategyKind::DirectName), 2);
        assert_eq!(stats.successes_for(StrategyKind::SynonymChase), 1);
        assert_eq!(stats.successes_for(StrategyKind::Cached), 1);
        assert_eq!(stats.successes_for(StrategyKind::FuzzyWildcard), 0);
        assert_eq!(stats.cache_hits(), 1);
    }

    #[test]
    fn test_skipped_not_found_stays_out_of_the_breakdown() {
        let stats = RunStats::new();
        stats.record(&ResolutionOutcome {
            name: "unobtainium".to_string(),
            smiles: None,
            strategy: Some(StrategyKind::Skipped),
            status: ResolutionStatus::NotFound,
            pair_errors: 0,
        });

        assert_eq!(stats.not_found(), 1);
        assert_eq!(stats.successes_for(StrategyKind::Skipped), 0);
        assert_eq!(stats.cache_hits(), 0);
    }

    #[test]
    fn test_snapshot_is_a_consistent_copy() {
        let stats = RunStats::new();
        stats.record(&success("a", StrategyKind::CidLookup));

        let snapshot = stats.snapshot();
        stats.record(&success("b", StrategyKind::CidLookup));

        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.successes_for(StrategyKind::CidLookup), 1);
        assert_eq!(stats.snapshot().processed, 2);
    }

    #[test]
    fn test_success_rate() {
        let stats = RunStats::new();
        assert!((stats.snapshot().success_rate() - 0.0).abs() < f64::EPSILON);

        stats.record(&success("a", StrategyKind::DirectName));
        stats.record(&ResolutionOutcome {
            name: "b".to_string(),
            smiles: None,
            strategy: None,
            status: ResolutionStatus::NotFound,
            pair_errors: 0,
        });

        assert!((stats.snapshot().success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(RunStats::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.record(&success("x", StrategyKind::DirectName));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.processed(), 1000);
        assert_eq!(stats.succeeded(), 1000);
        assert_eq!(stats.successes_for(StrategyKind::DirectName), 1000);
    }
}
