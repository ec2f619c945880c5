/*
[INPUT]:  Endpoint category and per-category published limits
[OUTPUT]: Admission outcomes (proceed, delay, reject) for outgoing calls
[POS]:    Rate governor - throttles REST calls against exchange limits
[UPDATE]: When the exchange publishes new limits or categories change
*/

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Exchange endpoint families, each throttled independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    Public,
    Market,
    Account,
}

impl EndpointCategory {
    fn index(self) -> usize {
        match self {
            EndpointCategory::Public => 0,
            EndpointCategory::Market => 1,
            EndpointCategory::Account => 2,
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointCategory::Public => write!(f, "public"),
            EndpointCategory::Market => write!(f, "market"),
            EndpointCategory::Account => write!(f, "account"),
        }
    }
}

/// Admission decision for one outgoing call.
///
/// `Delay` must be honored by suspending and then admitting again; token
/// state may have been consumed by interleaved callers in the meantime.
/// `Rejected` is fatal for the call and never retried by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionOutcome {
    Proceed,
    Delay(Duration),
    Rejected(String),
}

/// Published limit for one endpoint category
#[derive(Debug, Clone)]
pub struct CategoryLimit {
    /// Calls admitted per replenishment window
    pub capacity: u32,
    /// Fixed replenishment schedule
    pub window: Duration,
    /// Computed waits beyond this threshold are rejected outright; the
    /// exchange bans clients that queue this far past the limit
    pub reject_above: Duration,
}

impl Default for CategoryLimit {
    fn default() -> Self {
        Self {
            capacity: 60,
            window: Duration::from_secs(60),
            reject_above: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RateLimits {
    pub public: CategoryLimit,
    pub market: CategoryLimit,
    pub account: CategoryLimit,
}

impl RateLimits {
    fn get(&self, category: EndpointCategory) -> &CategoryLimit {
        match category {
            EndpointCategory::Public => &self.public,
            EndpointCategory::Market => &self.market,
            EndpointCategory::Account => &self.account,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    used: u32,
    overflow: u32,
}

impl Bucket {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            used: 0,
            overflow: 0,
        }
    }

    /// Advance to the current window, replenishing on the fixed schedule.
    fn roll(&mut self, now: Instant, window: Duration) {
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= window {
            let windows = (elapsed.as_nanos() / window.as_nanos()) as u32;
            self.window_start += window * windows;
            self.used = 0;
            self.overflow = 0;
        }
    }
}

/// Token-count throttle per endpoint category.
///
/// State sits behind a single mutex and the lock is never held across an
/// await; callers that suspend on a `Delay` must admit again afterwards.
#[derive(Debug)]
pub struct RateGovernor {
    limits: RateLimits,
    buckets: Mutex<[Bucket; 3]>,
}

impl RateGovernor {
    pub fn new(limits: RateLimits) -> Self {
        let now = Instant::now();
        Self {
            limits,
            buckets: Mutex::new([Bucket::new(now), Bucket::new(now), Bucket::new(now)]),
        }
    }

    /// Decide whether a call in `category` may go out now.
    ///
    /// Never drops a request: every excess call gets either the wait that
    /// would clear it or an explicit rejection.
    pub fn admit(&self, category: EndpointCategory) -> AdmissionOutcome {
        let limit = self.limits.get(category);
        let now = Instant::now();
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let bucket = &mut buckets[category.index()];
        bucket.roll(now, limit.window);

        if bucket.used < limit.capacity {
            bucket.used += 1;
            return AdmissionOutcome::Proceed;
        }

        bucket.overflow += 1;
        let windows_ahead = (bucket.overflow - 1) / limit.capacity;
        let until_next = (bucket.window_start + limit.window).saturating_duration_since(now);
        let wait = until_next + limit.window * windows_ahead;

        if wait > limit.reject_above {
            tracing::warn!(
                category = %category,
                wait_ms = wait.as_millis() as u64,
                threshold_ms = limit.reject_above.as_millis() as u64,
                "admission rejected"
            );
            AdmissionOutcome::Rejected(format!(
                "required wait of {}ms exceeds the {}ms ban threshold",
                wait.as_millis(),
                limit.reject_above.as_millis()
            ))
        } else {
            tracing::debug!(
                category = %category,
                wait_ms = wait.as_millis() as u64,
                "admission delayed"
            );
            AdmissionOutcome::Delay(wait)
        }
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}
