//! CLI argument definitions using clap derive macros.

use std::time::Duration;

use clap::Parser;

use chemresolve_core::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS, DEFAULT_REPORT_INTERVAL, EngineConfig, EngineMode,
};

/// Resolve free-text chemical names to canonical SMILES.
///
/// Chemresolve runs each name through a cascade of PubChem lookup
/// strategies, from cheap exact matches to fuzzy wildcard searches, and
/// writes one tab-separated `name<TAB>smiles` row per input row.
#[derive(Parser, Debug)]
#[command(name = "chemresolve")]
#[command(author, version, about)]
pub struct Args {
    /// Compound names to resolve (reads stdin, one name per line, if omitted)
    pub names: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Scheduling mode: 'cooperative' or 'worker-pool'
    #[arg(short = 'm', long, default_value_t = EngineMode::Cooperative)]
    pub mode: EngineMode,

    /// Maximum concurrent cascades or pool workers (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Maximum simultaneously outstanding backend requests (1-100)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub max_in_flight: u8,

    /// Attempt budget per backend request, including the first try (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Minimum delay between backend requests in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub request_spacing: u64,

    /// Per-request timeout in seconds (1-300)
    #[arg(short = 't', long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: u64,

    /// Disable the fuzzy wildcard strategy
    #[arg(long)]
    pub no_fuzzy: bool,

    /// Emit a progress snapshot every N completed names (0 to disable)
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL as u64, value_parser = clap::value_parser!(u64).range(0..=100_000))]
    pub report_interval: u64,

    /// Backend base URL override (defaults to production PubChem)
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Args {
    /// Maps the parsed flags onto an engine configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            concurrency: usize::from(self.concurrency),
            max_in_flight_requests: usize::from(self.max_in_flight),
            request_spacing: Duration::from_millis(self.request_spacing),
            request_timeout: Duration::from_secs(self.timeout),
            max_attempts: u32::from(self.max_attempts),
            backoff_base: EngineConfig::default().backoff_base,
            fuzzy_enabled: !self.no_fuzzy,
            report_interval: usize::try_from(self.report_interval).unwrap_or(usize::MAX),
            base_url: self.base_url.clone(),
        }
    }
}
