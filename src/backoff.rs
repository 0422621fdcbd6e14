use rand::Rng;
use std::time::Duration;

/// Source of delays between retries of transient failures.
pub trait Backoff: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random delay in a fixed range, independent of the attempt number.
///
/// The service's rate limit headers are the primary throttling signal; this
/// only spreads retries out so concurrent callers do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct JitterBackoff {
    min_ms: u64,
    max_ms: u64,
}

impl JitterBackoff {
    /// Bounds are rounded down to whole milliseconds and swapped if reversed.
    pub fn new(min: Duration, max: Duration) -> Self {
        let (a, b) = (min.as_millis() as u64, max.as_millis() as u64);
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
        }
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for JitterBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(5000))
    }
}

impl Backoff for JitterBackoff {
    fn next_delay(&self) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}
