use crate::key_generator::BucketKey;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RESET_AFTER_HEADER: &str = "x-ratelimit-reset-after";
pub const GLOBAL_HEADER: &str = "x-ratelimit-global";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Shared throttle coordinator consulted by the dispatcher around every attempt.
///
/// `check` suspends the caller until the bucket has capacity and never fails.
/// `update` records whatever the response says about the bucket and never fails.
/// Implementations must tolerate arbitrarily many concurrent callers.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, bucket: &BucketKey);

    async fn update(&self, bucket: &BucketKey, response: &Response);
}

/// Rate limit information carried by a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_after: Option<Duration>,
    pub retry_after: Option<Duration>,
    pub global: bool,
}

impl RateLimitHeaders {
    /// Parse rate limit headers. Malformed values are treated as absent.
    pub fn parse(headers: &HeaderMap) -> Self {
        let reset_after = header_value::<f64>(headers, RESET_AFTER_HEADER)
            .and_then(seconds)
            .or_else(|| header_value::<f64>(headers, RESET_HEADER).and_then(until_epoch));

        Self {
            limit: header_value(headers, LIMIT_HEADER),
            remaining: header_value(headers, REMAINING_HEADER),
            reset_after,
            retry_after: header_value::<f64>(headers, RETRY_AFTER_HEADER).and_then(seconds),
            global: headers
                .get(GLOBAL_HEADER)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| !value.trim().eq_ignore_ascii_case("false")),
        }
    }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value.max(0.0)).ok()
}

fn until_epoch(epoch_secs: f64) -> Option<Duration> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    seconds(epoch_secs - now.as_secs_f64())
}

/// Buckets past this count trigger a sweep of idle entries on insert
pub const CLEANUP_THRESHOLD: usize = 1024;

/// Longest a caller waits for an `update` on an exhausted bucket with no known
/// reset before a single request is let through to learn the bucket's state.
pub const STALE_BUCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Accounting for one bucket
#[derive(Debug, Default)]
struct BucketState {
    limit: Option<u32>,
    remaining: Option<u32>,
    reset_at: Option<Instant>,
}

/// What a caller at the head of a bucket's queue has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Ready,
    WaitFor(Duration),
    WaitForUpdate,
}

impl BucketState {
    /// Refills once the window passed, then decides whether the next request may go.
    fn admission(&mut self, now: Instant) -> Admission {
        if self.reset_at.is_some_and(|reset_at| reset_at <= now) {
            self.remaining = self.limit;
            self.reset_at = None;
        }

        match (self.remaining, self.reset_at) {
            (Some(0), Some(reset_at)) => Admission::WaitFor(reset_at - now),
            (Some(0), None) => Admission::WaitForUpdate,
            _ => Admission::Ready,
        }
    }

    fn consume(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Nothing pending: the window has passed, or no window and capacity left.
    fn is_idle(&self, now: Instant) -> bool {
        match self.reset_at {
            Some(reset_at) => reset_at <= now,
            None => self.remaining != Some(0),
        }
    }
}

#[derive(Debug, Default)]
struct Bucket {
    // Held across the wait so same-bucket callers are admitted one at a time, FIFO.
    gate: tokio::sync::Mutex<()>,
    state: Mutex<BucketState>,
    updated: Notify,
}

/// In-memory limiter driven by the service's rate limit headers.
///
/// Capacity is unknown until the first response for a bucket arrives, so the
/// first request on every bucket goes straight through. Once a bucket is
/// exhausted, callers wait for its reset or, when the reset is unknown, for
/// the next `update` on that bucket.
///
/// One bucket exists per route and guild/channel ever touched. Idle buckets
/// are swept once the map grows past [`CLEANUP_THRESHOLD`], or on demand with
/// [`BucketRateLimiter::cleanup_idle_buckets`].
#[derive(Debug, Default)]
pub struct BucketRateLimiter {
    buckets: RwLock<HashMap<BucketKey, Arc<Bucket>>>,
    global_reset: Mutex<Option<Instant>>,
}

impl BucketRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, key: &BucketKey) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.read().get(key) {
            return bucket.clone();
        }

        let mut buckets = self.buckets.write();
        if buckets.len() >= CLEANUP_THRESHOLD && !buckets.contains_key(key) {
            let removed = Self::retain_busy(&mut buckets, Instant::now());
            debug!(removed, "Swept idle rate limit buckets");
        }
        buckets.entry(key.clone()).or_default().clone()
    }

    fn retain_busy(buckets: &mut HashMap<BucketKey, Arc<Bucket>>, now: Instant) -> usize {
        let initial_count = buckets.len();
        // A bucket referenced outside the map has a caller inside `check`.
        buckets.retain(|_, bucket| Arc::strong_count(bucket) > 1 || !bucket.state.lock().is_idle(now));
        initial_count - buckets.len()
    }

    /// Time left on the global lock, if one is in force
    fn global_delay(&self) -> Option<Duration> {
        let now = Instant::now();
        (*self.global_reset.lock())
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Known remaining capacity for a bucket
    pub fn remaining(&self, key: &BucketKey) -> Option<u32> {
        self.buckets
            .read()
            .get(key)
            .and_then(|bucket| bucket.state.lock().remaining)
    }

    /// Number of buckets currently tracked
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }

    /// Forget everything known about a bucket. Queued callers keep their place.
    pub fn reset(&self, key: &BucketKey) {
        if let Some(bucket) = self.buckets.read().get(key) {
            *bucket.state.lock() = BucketState::default();
            bucket.updated.notify_waiters();
        }
    }

    /// Drop buckets with nothing pending and no caller using them
    pub fn cleanup_idle_buckets(&self) -> usize {
        Self::retain_busy(&mut self.buckets.write(), Instant::now())
    }
}

#[async_trait]
impl RateLimiter for BucketRateLimiter {
    async fn check(&self, key: &BucketKey) {
        let bucket = self.bucket(key);
        let _gate = bucket.gate.lock().await;

        loop {
            // Registered before the state is read so an update in between is not missed.
            let updated = bucket.updated.notified();

            if let Some(delay) = self.global_delay() {
                debug!(wait_ms = delay.as_millis() as u64, "Waiting out global rate limit");
                sleep(delay).await;
                continue;
            }

            let admission = bucket.state.lock().admission(Instant::now());
            match admission {
                Admission::Ready => break,
                Admission::WaitFor(delay) => {
                    debug!(
                        bucket = %key,
                        wait_ms = delay.as_millis() as u64,
                        "Bucket exhausted, waiting for reset"
                    );
                    sleep(delay).await;
                }
                Admission::WaitForUpdate => {
                    debug!(bucket = %key, "Bucket exhausted with unknown reset, waiting for a response");
                    if timeout(STALE_BUCKET_TIMEOUT, updated).await.is_err() {
                        warn!(bucket = %key, "No rate limit update arrived, letting one request through");
                        break;
                    }
                }
            }
        }

        bucket.state.lock().consume();
    }

    async fn update(&self, key: &BucketKey, response: &Response) {
        let headers = RateLimitHeaders::parse(response.headers());
        let now = Instant::now();

        if response.status() == StatusCode::TOO_MANY_REQUESTS && headers.global {
            let retry_after = headers
                .retry_after
                .or(headers.reset_after)
                .unwrap_or_default();
            warn!(retry_after_ms = retry_after.as_millis() as u64, "Hit global rate limit");

            let until = now + retry_after;
            let mut global = self.global_reset.lock();
            let current = *global;
            *global = Some(current.map_or(until, |current| current.max(until)));
            return;
        }

        let bucket = self.bucket(key);
        {
            let mut state = bucket.state.lock();
            if headers.limit.is_some() {
                state.limit = headers.limit;
            }

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = headers
                    .retry_after
                    .or(headers.reset_after)
                    .unwrap_or_default();
                state.remaining = Some(0);
                state.reset_at = Some(now + retry_after);
            } else {
                if headers.remaining.is_some() {
                    state.remaining = headers.remaining;
                }
                if let Some(reset_after) = headers.reset_after {
                    state.reset_at = Some(now + reset_after);
                }
            }
        }
        bucket.updated.notify_waiters();
    }
}
