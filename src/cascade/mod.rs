//! Resolution cascade: ordered lookup strategies with short-circuit.
//!
//! Each [`Strategy`] implements one way of turning a query variant into a
//! SMILES string. The [`Cascade`] runs them in fixed priority order, cheapest
//! first, over every variant of a name, and stops at the first plausible hit.
//! Strategies are trait objects so the active set can be assembled from
//! configuration (the fuzzy strategy is optional).

mod cid;
mod direct;
mod freetext;
mod fuzzy;
mod synonym;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::cache::{FailureRegistry, ResolutionCache};
use crate::client::{LookupError, PubChemClient};
use crate::normalize;
use crate::smiles::is_valid_smiles;

pub use cid::CidLookupStrategy;
pub use direct::DirectNameStrategy;
pub use freetext::FreeTextStrategy;
pub use fuzzy::FuzzyWildcardStrategy;
pub use synonym::SynonymChaseStrategy;

/// How a resolution was achieved (or why it was skipped).
///
/// Declaration order is the cascade's priority order; [`StrategyKind::Cached`]
/// and [`StrategyKind::Skipped`] are attribution-only and never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyKind {
    /// Exact name lookup.
    DirectName,
    /// Name to CID list, then CID to SMILES.
    CidLookup,
    /// Name to synonym list, then synonym lookups.
    SynonymChase,
    /// POST lookup with the raw name in the request body.
    FreeText,
    /// Wildcard name search, then CID follow-ups.
    FuzzyWildcard,
    /// Served from the run cache without backend traffic.
    Cached,
    /// Skipped because the name already exhausted its cascade this run.
    Skipped,
}

impl StrategyKind {
    /// Number of kinds, for per-strategy counter arrays.
    pub const COUNT: usize = 7;

    /// Stable human-readable label, used in logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DirectName => "direct-name",
            Self::CidLookup => "cid-lookup",
            Self::SynonymChase => "synonym-chase",
            Self::FreeText => "free-text",
            Self::FuzzyWildcard => "fuzzy-wildcard",
            Self::Cached => "cached",
            Self::Skipped => "skipped",
        }
    }

    /// Index into per-strategy counter arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::DirectName => 0,
            Self::CidLookup => 1,
            Self::SynonymChase => 2,
            Self::FreeText => 3,
            Self::FuzzyWildcard => 4,
            Self::Cached => 5,
            Self::Skipped => 6,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final status of one name's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// A plausible SMILES was found and cached.
    Success,
    /// Every strategy and variant was exhausted without a hit.
    NotFound,
    /// The name produced no usable query variants.
    Invalid,
    /// The name's cascade was lost to a controller failure.
    Error,
}

/// One name's resolution result for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// The raw compound name as submitted.
    pub name: String,
    /// The resolved SMILES, present only on success.
    pub smiles: Option<String>,
    /// The strategy that produced the hit (or attribution for cache/skip).
    pub strategy: Option<StrategyKind>,
    /// Final status.
    pub status: ResolutionStatus,
    /// Transport-level (strategy, variant) pair errors absorbed on the way.
    pub pair_errors: u32,
}

impl ResolutionOutcome {
    fn success(name: &str, smiles: String, strategy: StrategyKind, pair_errors: u32) -> Self {
        Self {
            name: name.to_string(),
            smiles: Some(smiles),
            strategy: Some(strategy),
            status: ResolutionStatus::Success,
            pair_errors,
        }
    }

    fn not_found(name: &str, strategy: Option<StrategyKind>, pair_errors: u32) -> Self {
        Self {
            name: name.to_string(),
            smiles: None,
            strategy,
            status: ResolutionStatus::NotFound,
            pair_errors,
        }
    }

    fn invalid(name: &str) -> Self {
        Self {
            name: name.to_string(),
            smiles: None,
            strategy: None,
            status: ResolutionStatus::Invalid,
            pair_errors: 0,
        }
    }

    /// Marks a name whose cascade never completed (controller failure).
    #[must_use]
    pub fn error(name: &str) -> Self {
        Self {
            name: name.to_string(),
            smiles: None,
            strategy: None,
            status: ResolutionStatus::Error,
            pair_errors: 0,
        }
    }
}

/// One resolution strategy.
///
/// `async_trait` keeps the trait object-safe so the cascade can hold a
/// priority-ordered `Vec<Box<dyn Strategy>>`.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Which kind this strategy implements.
    fn kind(&self) -> StrategyKind;

    /// Stable name for logs.
    fn name(&self) -> &'static str {
        self.kind().label()
    }

    /// Attempts to resolve one query variant.
    ///
    /// `Ok(None)` is a miss; `Err` is a transport failure that survived the
    /// retry budget and is charged to this (strategy, variant) pair only.
    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError>;
}

/// Builds the strategy list in priority order, cheapest first.
#[must_use]
pub fn default_strategies(fuzzy_enabled: bool) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(DirectNameStrategy),
        Box::new(CidLookupStrategy),
        Box::new(SynonymChaseStrategy),
        Box::new(FreeTextStrategy),
    ];
    if fuzzy_enabled {
        strategies.push(Box::new(FuzzyWildcardStrategy));
    }
    strategies
}

/// Runs the strategy cascade for individual names.
///
/// Shared across concurrent tasks via `Arc`; the cache and failure registry
/// make repeat names free.
pub struct Cascade {
    client: Arc<PubChemClient>,
    strategies: Vec<Box<dyn Strategy>>,
    cache: Arc<ResolutionCache>,
    failures: Arc<FailureRegistry>,
}

impl Cascade {
    /// Creates a cascade over the given client and strategy list.
    #[must_use]
    pub fn new(
        client: Arc<PubChemClient>,
        strategies: Vec<Box<dyn Strategy>>,
        cache: Arc<ResolutionCache>,
        failures: Arc<FailureRegistry>,
    ) -> Self {
        Self {
            client,
            strategies,
            cache,
            failures,
        }
    }

    /// Resolves one raw compound name.
    ///
    /// Never returns an error: transport failures are absorbed as pair-error
    /// counts and the cascade moves on to the next (strategy, variant) pair.
    #[instrument(skip(self), fields(name))]
    pub async fn resolve_one(&self, name: &str) -> ResolutionOutcome {
        if let Some(smiles) = self.cache.get(name) {
            debug!(name, "cache hit");
            return ResolutionOutcome::success(name, smiles, StrategyKind::Cached, 0);
        }

        if self.failures.contains(name) {
            debug!(name, "previously exhausted, skipping");
            return ResolutionOutcome::not_found(name, Some(StrategyKind::Skipped), 0);
        }

        let variants = normalize::variants(name);
        if variants.is_empty() {
            debug!(name, "no usable query variants");
            return ResolutionOutcome::invalid(name);
        }

        let mut pair_errors: u32 = 0;

        for strategy in &self.strategies {
            for variant in &variants {
                match strategy.attempt(&self.client, variant).await {
                    Ok(Some(smiles)) if is_valid_smiles(&smiles) => {
                        debug!(
                            name,
                            variant = variant.as_str(),
                            strategy = strategy.name(),
                            "resolved"
                        );
                        self.cache.insert(name, &smiles);
                        return ResolutionOutcome::success(
                            name,
                            smiles,
                            strategy.kind(),
                            pair_errors,
                        );
                    }
                    Ok(Some(implausible)) => {
                        debug!(
                            name,
                            variant = variant.as_str(),
                            strategy = strategy.name(),
                            smiles = implausible.as_str(),
                            "discarding implausible identifier"
                        );
                    }
                    Ok(None) => {
                        debug!(
                            name,
                            variant = variant.as_str(),
                            strategy = strategy.name(),
                            "miss"
                        );
                    }
                    Err(e) => {
                        debug!(
                            name,
                            variant = variant.as_str(),
                            strategy = strategy.name(),
                            error = %e,
                            "pair failed, continuing cascade"
                        );
                        pair_errors += 1;
                    }
                }
            }
        }

        debug!(name, "cascade exhausted");
        self.failures.record(name);
        ResolutionOutcome::not_found(name, None, pair_errors)
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field("strategies", &self.strategies.len())
            .finish_non_exhaustive()
    }
}
