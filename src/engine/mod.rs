//! Resolution engine: concurrency control over the strategy cascade.
//!
//! The engine schedules one cascade per compound name under a configurable
//! concurrency model. In [`EngineMode::Cooperative`] each name gets its own
//! Tokio task admitted through a counting semaphore; in
//! [`EngineMode::WorkerPool`] a fixed pool of worker tasks drains a shared
//! queue. Both modes produce the same name-to-outcome map for the same
//! input, so the mode is purely an operational choice.
//!
//! # Concurrency Model
//!
//! - Each cascade runs in its own Tokio task (or worker loop iteration)
//! - Permits/workers bound how many cascades run at once
//! - Backend pressure is bounded separately by the shared [`RequestGate`]
//! - A cooperative scheduling failure falls back to the worker pool for
//!   whatever names have not completed yet

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::cache::{FailureRegistry, ResolutionCache};
use crate::cascade::{Cascade, ResolutionOutcome, default_strategies};
use crate::client::{LookupError, PubChemClient, RequestGate, RetryPolicy};
use crate::config::{EngineConfig, EngineMode};

mod stats;

pub use stats::{RunStats, StatsSnapshot};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Error type for engine construction and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Backend client could not be constructed.
    #[error("backend client setup failed: {0}")]
    Client(#[from] LookupError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Schedules resolution cascades with bounded concurrency.
///
/// The engine owns the run-scoped state: one backend client behind a shared
/// [`RequestGate`], one cache, one failure registry, and one stats tracker.
/// Dropping the engine drops all of it, so nothing leaks between runs.
pub struct ResolutionEngine {
    config: EngineConfig,
    cascade: Arc<Cascade>,
    stats: Arc<RunStats>,
    cancelled: Arc<AtomicBool>,
}

impl ResolutionEngine {
    /// Creates an engine from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the concurrency is
    /// outside 1-100, or [`EngineError::Client`] if the HTTP client cannot
    /// be built.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(EngineError::InvalidConcurrency {
                value: config.concurrency,
            });
        }

        let gate = Arc::new(RequestGate::new(
            config.max_in_flight_requests,
            config.request_spacing,
        ));
        let retry_policy = RetryPolicy::with_backoff(config.max_attempts, config.backoff_base);
        let client = match config.base_url.as_deref() {
            Some(url) => PubChemClient::with_base_url(url, gate, retry_policy, config.request_timeout)?,
            None => PubChemClient::new(gate, retry_policy, config.request_timeout)?,
        };

        let cache = Arc::new(ResolutionCache::new());
        let failures = Arc::new(FailureRegistry::new());
        let cascade = Arc::new(Cascade::new(
            Arc::new(client),
            default_strategies(config.fuzzy_enabled),
            cache,
            failures,
        ));

        debug!(
            mode = %config.mode,
            concurrency = config.concurrency,
            max_in_flight = config.max_in_flight_requests,
            spacing_ms = config.request_spacing.as_millis(),
            fuzzy = config.fuzzy_enabled,
            "creating resolution engine"
        );

        Ok(Self {
            config,
            cascade,
            stats: Arc::new(RunStats::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Returns the configured scheduling mode.
    #[must_use]
    pub fn mode(&self) -> EngineMode {
        self.config.mode
    }

    /// Returns the run statistics tracker.
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Returns a handle that stops admission of new names when set.
    ///
    /// Cascades already in flight run to completion; names not yet admitted
    /// are left out of the result map.
    #[must_use]
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Resolves every name and returns the name-to-outcome map.
    ///
    /// Duplicate names are resolved once. Individual resolution failures do
    /// NOT fail the run: they are carried in each name's
    /// [`ResolutionOutcome`] and counted in the stats. If cooperative
    /// scheduling itself fails, the engine logs the failure and reruns the
    /// unfinished names through the worker pool.
    #[instrument(skip(self, names), fields(total = names.len(), mode = %self.config.mode))]
    pub async fn resolve_all(&self, names: &[String]) -> HashMap<String, ResolutionOutcome> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        info!(unique = unique.len(), "starting resolution run");

        let outcomes: Arc<DashMap<String, ResolutionOutcome>> = Arc::new(DashMap::new());

        match self.config.mode {
            EngineMode::Cooperative => {
                if let Err(e) = self.run_cooperative(&unique, &outcomes).await {
                    warn!(error = %e, "cooperative scheduling failed; falling back to worker pool");
                    let remaining: Vec<String> = unique
                        .iter()
                        .filter(|name| !outcomes.contains_key(*name))
                        .cloned()
                        .collect();
                    self.run_worker_pool(remaining, &outcomes).await;
                }
            }
            EngineMode::WorkerPool => self.run_worker_pool(unique, &outcomes).await,
        }

        let snapshot = self.stats.snapshot();
        info!(
            processed = snapshot.processed,
            succeeded = snapshot.succeeded,
            not_found = snapshot.not_found,
            invalid = snapshot.invalid,
            errored = snapshot.errored,
            pair_errors = snapshot.pair_errors,
            "resolution run complete"
        );

        outcomes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// One task per name, admitted through a counting semaphore.
    async fn run_cooperative(
        &self,
        names: &[String],
        outcomes: &Arc<DashMap<String, ResolutionOutcome>>,
    ) -> Result<(), EngineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::new();

        for name in names {
            if self.cancelled.load(Ordering::SeqCst) {
                info!("cancellation requested; no further names admitted");
                break;
            }

            // Acquire before spawning so admission itself is bounded
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let cascade = Arc::clone(&self.cascade);
            let stats = Arc::clone(&self.stats);
            let outcomes = Arc::clone(outcomes);
            let report_interval = self.config.report_interval;
            let name = name.clone();

            handles.push((
                name.clone(),
                tokio::spawn(async move {
                    // Permit is dropped when this block exits (RAII)
                    let _permit = permit;

                    let outcome = cascade.resolve_one(&name).await;
                    stats.record(&outcome);
                    outcomes.insert(name, outcome);
                    note_progress(&stats, report_interval);
                }),
            ));
        }

        for (name, handle) in handles {
            if let Err(e) = handle.await {
                warn!(name = name.as_str(), error = %e, "resolution task panicked");
                let outcome = ResolutionOutcome::error(&name);
                self.stats.record(&outcome);
                outcomes.insert(name, outcome);
            }
        }

        Ok(())
    }

    /// A fixed pool of worker tasks pulling names from a shared queue.
    async fn run_worker_pool(
        &self,
        names: Vec<String>,
        outcomes: &Arc<DashMap<String, ResolutionOutcome>>,
    ) {
        let queue: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(names.into_iter().collect()));
        let mut handles = Vec::new();

        for worker_id in 0..self.config.concurrency {
            let queue = Arc::clone(&queue);
            let cascade = Arc::clone(&self.cascade);
            let stats = Arc::clone(&self.stats);
            let outcomes = Arc::clone(outcomes);
            let cancelled = Arc::clone(&self.cancelled);
            let report_interval = self.config.report_interval;

            handles.push(tokio::spawn(async move {
                loop {
                    if cancelled.load(Ordering::SeqCst) {
                        debug!(worker_id, "worker stopping on cancellation");
                        break;
                    }

                    let next = match queue.lock() {
                        Ok(mut queue) => queue.pop_front(),
                        Err(_) => {
                            warn!(worker_id, "work queue poisoned; worker stopping");
                            break;
                        }
                    };
                    let Some(name) = next else {
                        debug!(worker_id, "work queue drained");
                        break;
                    };

                    let outcome = cascade.resolve_one(&name).await;
                    stats.record(&outcome);
                    outcomes.insert(name, outcome);
                    note_progress(&stats, report_interval);
                }
            }));
        }

        for handle in handles {
            // Task panics are logged but don't fail the batch
            if let Err(e) = handle.await {
                warn!(error = %e, "resolution worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Emits a progress snapshot every `report_interval` completed names.
fn note_progress(stats: &RunStats, report_interval: usize) {
    if report_interval == 0 {
        return;
    }
    let snapshot = stats.snapshot();
    if snapshot.processed % report_interval == 0 {
        info!(
            processed = snapshot.processed,
            succeeded = snapshot.succeeded,
            not_found = snapshot.not_found,
            invalid = snapshot.invalid,
            errored = snapshot.errored,
            pair_errors = snapshot.pair_errors,
            cache_hits = snapshot.cache_hits,
            "progress"
        );
    }
}
