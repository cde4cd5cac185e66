//! Pluggable request rate limiting.
//!
//! The relay runs a pre-handler check before every request touches the
//! store. The default is a no-op; deployments that need protection can
//! plug in the token bucket (or anything else implementing [`RateLimit`]).

use std::time::Instant;

use parking_lot::Mutex;

/// Pre-handler admission check.
///
/// Returning `false` rejects the request with `429 Too Many Requests`
/// before any validation or store work happens.
pub trait RateLimit: Send + Sync {
    /// Should this request be admitted?
    fn allow(&self) -> bool;
}

/// The default hook: admit everything.
#[derive(Debug, Default)]
pub struct NoLimit;

impl RateLimit for NoLimit {
    fn allow(&self) -> bool {
        true
    }
}

/// Global token bucket.
///
/// Tokens refill continuously at `rate_per_sec`; the bucket holds at most
/// `rate_per_sec * burst_multiplier`, so short bursts above the steady
/// rate are admitted until the accumulated allowance runs out.
pub struct TokenBucket {
    rate_per_sec: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket admitting `rate_per_sec` requests per second with
    /// the given burst multiplier.
    pub fn new(rate_per_sec: u32, burst_multiplier: u32) -> Self {
        let capacity = f64::from(rate_per_sec) * f64::from(burst_multiplier.max(1));
        Self {
            rate_per_sec: f64::from(rate_per_sec),
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }
}

impl RateLimit for TokenBucket {
    fn allow(&self) -> bool {
        let mut state = self.state.lock();

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("rate_per_sec", &self.rate_per_sec)
            .field("capacity", &self.capacity)
            .finish()
    }
}
