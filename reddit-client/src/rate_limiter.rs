use reddit_data_core::RateLimitSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_tokens: u32,
    pub refill_window: Duration,
    /// Randomized delay applied after every granted token.
    pub pacing_min: Duration,
    pub pacing_max: Duration,
}

impl RateLimitConfig {
    pub fn live_backend() -> Self {
        Self {
            max_tokens: 3,                         // Unauthenticated reddit.com tolerates short bursts only
            refill_window: Duration::from_secs(60), // 3 requests per minute sustained
            pacing_min: Duration::from_secs(1),
            pacing_max: Duration::from_secs(5),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            max_tokens: settings.max_tokens,
            refill_window: Duration::from_secs(settings.refill_window_secs),
            pacing_min: Duration::from_millis(settings.pacing_min_ms),
            pacing_max: Duration::from_millis(settings.pacing_max_ms),
        }
    }

    /// Same bucket without the pacing delay.
    pub fn without_pacing(mut self) -> Self {
        self.pacing_min = Duration::ZERO;
        self.pacing_max = Duration::ZERO;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::live_backend()
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    granted: u64,
    denied: u64,
}

/// Token bucket guarding the live backend. Refill is computed lazily on
/// each acquisition; the lock covers token accounting only, never sleeps
/// or network calls.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = config.max_tokens as f64;
        let refill_rate = capacity / config.refill_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
                granted: 0,
                denied: 0,
            }),
            capacity,
            refill_rate,
            config,
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.duration_since(state.last_refill);
        let tokens_to_add = elapsed.as_secs_f64() * self.refill_rate;

        state.tokens = (state.tokens + tokens_to_add).min(self.capacity);
        state.last_refill = now;
    }

    /// Takes one token. With `wait == false` an empty bucket is reported
    /// immediately as `false` without consuming anything; with `wait == true`
    /// the caller sleeps for its own observed deficit and tries again.
    /// Every granted token is followed by the pacing delay.
    pub async fn acquire(&self, wait: bool) -> bool {
        loop {
            let deficit = {
                let mut state = self.state.lock().await;
                self.refill(&mut state, Instant::now());

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    state.granted += 1;
                    None
                } else if !wait {
                    state.denied += 1;
                    debug!(
                        "Rate limit token denied ({:.2} tokens available)",
                        state.tokens
                    );
                    return false;
                } else {
                    Some(1.0 - state.tokens)
                }
            };

            match deficit {
                None => break,
                Some(deficit) => {
                    let wait_time = Duration::from_secs_f64(deficit / self.refill_rate)
                        .max(Duration::from_millis(1));
                    debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        let pacing = self.pacing_delay();
        if !pacing.is_zero() {
            debug!("Pacing live request by {:?}", pacing);
            sleep(pacing).await;
        }
        true
    }

    fn pacing_delay(&self) -> Duration {
        let min = self.config.pacing_min.as_millis() as u64;
        let max = self.config.pacing_max.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }

    /// Longest a single blocking acquire can sleep when it is not raced by
    /// other waiters: one full token interval plus the maximum pacing.
    pub fn max_wait(&self) -> Duration {
        self.config.refill_window / self.config.max_tokens + self.config.pacing_max
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());

        RateLimitStatus {
            available_tokens: state.tokens,
            max_tokens: self.config.max_tokens,
            refill_per_minute: self.refill_rate * 60.0,
            granted: state.granted,
            denied: state.denied,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub available_tokens: f64,
    pub max_tokens: u32,
    pub refill_per_minute: f64,
    pub granted: u64,
    pub denied: u64,
}

impl RateLimitStatus {
    pub fn utilization_percentage(&self) -> f64 {
        let used_tokens = self.max_tokens as f64 - self.available_tokens;
        (used_tokens / self.max_tokens as f64) * 100.0
    }

    pub fn is_near_limit(&self) -> bool {
        self.available_tokens < 1.0
    }
}
