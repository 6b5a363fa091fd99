//! Joining outcomes back onto the input rows, plus the run report.

use std::collections::HashMap;
use std::fmt;

use crate::cascade::{ResolutionOutcome, StrategyKind};
use crate::engine::StatsSnapshot;

/// One input row enriched with its resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    /// The row's compound name, exactly as submitted.
    pub name: String,
    /// The resolved SMILES, if any.
    pub smiles: Option<String>,
}

/// Joins outcomes back onto the original rows by compound name.
///
/// The join is one-to-many: a name appearing on several rows receives the
/// same identifier on every row, and row order is preserved. Rows whose
/// name never completed (cancelled mid-run) join as unresolved.
#[must_use]
pub fn join_rows(
    rows: &[String],
    outcomes: &HashMap<String, ResolutionOutcome>,
) -> Vec<JoinedRow> {
    rows.iter()
        .map(|name| JoinedRow {
            name: name.clone(),
            smiles: outcomes.get(name).and_then(|o| o.smiles.clone()),
        })
        .collect()
}

/// Human-readable summary of one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    /// Total input rows, duplicates included.
    pub total_rows: usize,
    /// Unique names the engine processed.
    pub unique_names: usize,
    snapshot: StatsSnapshot,
}

impl StatsReport {
    /// Builds a report from the row count and a final stats snapshot.
    #[must_use]
    pub fn new(total_rows: usize, snapshot: StatsSnapshot) -> Self {
        Self {
            total_rows,
            unique_names: snapshot.processed,
            snapshot,
        }
    }

    /// Returns the underlying snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }
}

/// Strategies that can win a cascade, in priority order, for the breakdown.
const REPORTED_STRATEGIES: [StrategyKind; 6] = [
    StrategyKind::DirectName,
    StrategyKind::CidLookup,
    StrategyKind::SynonymChase,
    StrategyKind::FreeText,
    StrategyKind::FuzzyWildcard,
    StrategyKind::Cached,
];

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        writeln!(
            f,
            "Resolved {}/{} unique names ({} rows)",
            s.succeeded, self.unique_names, self.total_rows
        )?;
        writeln!(
            f,
            "  not found: {}, invalid: {}, errored: {}",
            s.not_found, s.invalid, s.errored
        )?;
        writeln!(
            f,
            "  cache hits: {}, request errors absorbed: {}",
            s.cache_hits, s.pair_errors
        )?;
        writeln!(f, "By strategy:")?;
        for strategy in REPORTED_STRATEGIES {
            let count = s.successes_for(strategy);
            if count > 0 {
                writeln!(f, "  {strategy}: {count}")?;
            }
        }
        Ok(())
    }
}
