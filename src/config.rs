//! Engine configuration and defaults.
//!
//! Defaults mirror careful-citizen behavior against the production backend:
//! modest concurrency, request spacing under PubChem's ~5 req/s guidance,
//! and a retry budget of four attempts per request.

use std::str::FromStr;
use std::time::Duration;

/// Default number of concurrent cascades (or pool workers).
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default cap on simultaneously outstanding backend requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 30;

/// Default minimum spacing between backend request starts.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_millis(200);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default progress report interval, in completed names.
pub const DEFAULT_REPORT_INTERVAL: usize = 20;

/// How the engine schedules cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    /// One task per name, admitted through a counting semaphore.
    #[default]
    Cooperative,
    /// A fixed pool of worker tasks pulling names from a shared queue.
    WorkerPool,
}

impl EngineMode {
    /// Stable label used in logs and CLI parsing.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::WorkerPool => "worker-pool",
        }
    }
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cooperative" => Ok(Self::Cooperative),
            "worker-pool" | "worker_pool" | "workerpool" => Ok(Self::WorkerPool),
            other => Err(format!(
                "unknown mode '{other}' (expected 'cooperative' or 'worker-pool')"
            )),
        }
    }
}

/// Tunables for one engine run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scheduling mode.
    pub mode: EngineMode,

    /// Concurrent cascades (Cooperative) or pool size (WorkerPool), 1-100.
    pub concurrency: usize,

    /// Cap on simultaneously outstanding backend requests.
    pub max_in_flight_requests: usize,

    /// Minimum spacing between backend request starts. Zero disables pacing.
    pub request_spacing: Duration,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Attempt budget per backend request (including the initial attempt).
    pub max_attempts: u32,

    /// Base delay for retry backoff.
    pub backoff_base: Duration,

    /// Whether the fuzzy wildcard strategy participates in the cascade.
    pub fuzzy_enabled: bool,

    /// Emit a progress snapshot every this many completed names.
    pub report_interval: usize,

    /// Backend base URL override; `None` targets production PubChem.
    pub base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Cooperative,
            concurrency: DEFAULT_CONCURRENCY,
            max_in_flight_requests: DEFAULT_MAX_IN_FLIGHT,
            request_spacing: DEFAULT_REQUEST_SPACING,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: crate::client::DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(500),
            fuzzy_enabled: true,
            report_interval: DEFAULT_REPORT_INTERVAL,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, EngineMode::Cooperative);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.max_in_flight_requests, 30);
        assert_eq!(config.request_spacing, Duration::from_millis(200));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.backoff_base, Duration::from_millis(500));
        assert!(config.fuzzy_enabled);
        assert_eq!(config.report_interval, 20);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_engine_mode_from_str() {
        assert_eq!(
            "cooperative".parse::<EngineMode>(),
            Ok(EngineMode::Cooperative)
        );
        assert_eq!(
            "worker-pool".parse::<EngineMode>(),
            Ok(EngineMode::WorkerPool)
        );
        assert_eq!(
            "Worker_Pool".parse::<EngineMode>(),
            Ok(EngineMode::WorkerPool)
        );
        assert!("threads".parse::<EngineMode>().is_err());
    }

    #[test]
    fn test_engine_mode_display_round_trips() {
        for mode in [EngineMode::Cooperative, EngineMode::WorkerPool] {
            assert_eq!(mode.to_string().parse::<EngineMode>(), Ok(mode));
        }
    }
}
