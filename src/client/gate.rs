//! Admission gate for backend requests.
//!
//! PubChem asks clients to stay under roughly five requests per second and
//! signals overload with 429 + Retry-After. The [`RequestGate`] enforces both
//! sides of that contract independently of how many cascades run
//! concurrently:
//!
//! - a counting semaphore bounds the number of simultaneously outstanding
//!   requests;
//! - a minimum spacing between request starts spreads traffic out;
//! - a server-mandated backoff window (from Retry-After) pauses all new
//!   request starts until it expires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative gate delay (30 seconds).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After value (5 minutes) to prevent excessive stalls.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Timing state shared by all requests.
#[derive(Debug)]
struct GateState {
    /// Time of the last request start. `None` before the first request.
    last_start: Option<Instant>,

    /// Server-mandated pause: no request may start before this instant.
    backoff_until: Option<Instant>,
}

/// Gate bounding outstanding backend requests and pacing their starts.
///
/// Designed to be wrapped in `Arc` and shared across spawned Tokio tasks.
/// The semaphore permit returned by [`RequestGate::acquire`] must be held
/// for the duration of the request and dropped when the response (or error)
/// is in hand.
#[derive(Debug)]
pub struct RequestGate {
    /// Bounds simultaneously outstanding requests.
    in_flight: Semaphore,

    /// Minimum spacing between request starts. Zero disables pacing.
    min_spacing: Duration,

    /// Protected timing state for atomic check-and-update.
    state: Mutex<GateState>,

    /// Cumulative delay applied by the gate, for the excessive-delay warning.
    cumulative_delay_ms: AtomicU64,
}

impl RequestGate {
    /// Creates a gate allowing `max_in_flight` outstanding requests with the
    /// given minimum spacing between request starts.
    #[must_use]
    #[instrument(fields(max_in_flight, spacing_ms = min_spacing.as_millis()))]
    pub fn new(max_in_flight: usize, min_spacing: Duration) -> Self {
        debug!("creating request gate");
        Self {
            in_flight: Semaphore::new(max_in_flight.max(1)),
            min_spacing,
            state: Mutex::new(GateState {
                last_start: None,
                backoff_until: None,
            }),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Returns the configured minimum spacing.
    #[must_use]
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Acquires permission to start a backend request.
    ///
    /// Waits for an in-flight slot, then for the spacing window and any
    /// server-mandated backoff to elapse. The returned permit must be held
    /// until the request completes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the semaphore has been closed, which does
    /// not happen while the gate is alive.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, tokio::sync::AcquireError> {
        let permit = self.in_flight.acquire().await?;

        // Lock held across the sleep so concurrent acquirers serialize their
        // start times instead of all sleeping until the same instant.
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let mut start_at = now;

        if let Some(last_start) = state.last_start {
            let spaced = last_start + self.min_spacing;
            if spaced > start_at {
                start_at = spaced;
            }
        }
        if let Some(backoff_until) = state.backoff_until {
            if backoff_until > start_at {
                start_at = backoff_until;
            } else {
                state.backoff_until = None;
            }
        }

        if start_at > now {
            let delay = start_at - now;
            let cumulative = self.add_cumulative_delay(delay);

            debug!(
                delay_ms = delay.as_millis(),
                cumulative_ms = cumulative.as_millis(),
                "pacing request start"
            );

            if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                warn!(
                    cumulative_delay_secs = cumulative.as_secs(),
                    "excessive gate delay - backend is throttling or spacing is too tight"
                );
            }

            tokio::time::sleep_until(start_at).await;
        }

        state.last_start = Some(Instant::now());
        drop(state);

        Ok(permit)
    }

    /// Records a server-mandated pause (from a 429 Retry-After header).
    ///
    /// All subsequent request starts wait until the pause expires. Overlapping
    /// pauses keep the later deadline.
    #[instrument(skip(self), fields(delay_ms = delay.as_millis()))]
    pub async fn record_rate_limit(&self, delay: Duration) {
        let deadline = Instant::now() + delay.min(MAX_RETRY_AFTER);

        let mut state = self.state.lock().await;
        match state.backoff_until {
            Some(existing) if existing >= deadline => {}
            _ => {
                state.backoff_until = Some(deadline);
                debug!("recorded server rate limit");
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let new_total = self.cumulative_delay_ms.fetch_add(delay_ms, Ordering::SeqCst) + delay_ms;
        Duration::from_millis(new_total)
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports both formats from RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2026 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at
/// 5 minutes.
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    // Integer seconds first (most common)
    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();

        if let Ok(duration) = datetime.duration_since(now) {
            if duration > MAX_RETRY_AFTER {
                warn!(
                    delay_secs = duration.as_secs(),
                    max_secs = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After date exceeds maximum, capping"
                );
                return Some(MAX_RETRY_AFTER);
            }
            Some(duration)
        } else {
            debug!(
                header_value,
                "Retry-After date is in the past, returning zero"
            );
            Some(Duration::ZERO)
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
