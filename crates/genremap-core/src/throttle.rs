//! Request pacing for the genre encyclopedia.
//!
//! Wraps any [`Fetcher`] so that consecutive requests to the same host start
//! at least `delay` apart, no matter how many tasks share the fetcher. Each
//! caller reserves the next free slot under a lock and then sleeps until it,
//! so a pool of concurrent workers never exceeds the configured rate.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use genremap_core::throttle::{ThrottledFetcher, ThrottleConfig};
//!
//! # use genremap_core::traits::Fetcher;
//! # #[derive(Clone)] struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<String, genremap_core::error::AppError> { todo!() }
//! # }
//! let config = ThrottleConfig::new(Duration::from_millis(500));
//! let fetcher = ThrottledFetcher::new(MyFetcher, config);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::error::AppError;
use crate::traits::Fetcher;

/// Longest gap the throttle will ever leave between two requests.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the throttled fetcher.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum gap between the starts of two requests to the same host.
    pub delay: Duration,

    /// Maximum random jitter added on top of `delay` (uniform [0, jitter]).
    /// `Duration::ZERO` disables it.
    pub jitter: Duration,
}

impl ThrottleConfig {
    /// Create a new config with the given delay and no jitter.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    /// Add random jitter (uniform [0, jitter]) on top of the base delay.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Compute the effective gap for one reservation (delay + random jitter),
    /// capped at [`MAX_DELAY`].
    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay.min(MAX_DELAY);
        }
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        self.delay
            .saturating_add(Duration::from_millis(rand_jitter_ms(max_ms)))
            .min(MAX_DELAY)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

/// A [`Fetcher`] wrapper that paces requests per host.
#[derive(Clone)]
pub struct ThrottledFetcher<F> {
    inner: F,
    config: ThrottleConfig,
    /// Earliest start time for the next request, per host key.
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<F: Fetcher> ThrottledFetcher<F> {
    /// Wrap an existing fetcher with throttling.
    pub fn new(inner: F, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Extract the host key from a URL (scheme://host:port).
    fn host_key(url_str: &str) -> Option<String> {
        let url = Url::parse(url_str).ok()?;
        let host = url.host_str()?;
        let port = url
            .port_or_known_default()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        Some(format!("{}://{}{}", url.scheme(), host, port))
    }

    /// Reserve the next request slot for `host` and wait until it arrives.
    async fn wait_for_slot(&self, host: &str) {
        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(host).map_or(now, |&next| next.max(now));
            slots.insert(host.to_string(), slot + self.config.effective_delay());
            slot
        };

        let now = Instant::now();
        if slot > now {
            let wait = slot - now;
            tracing::debug!(
                host = %host,
                sleep_ms = %wait.as_millis(),
                "Throttling request"
            );
            tokio::time::sleep_until(slot).await;
        }
    }
}

impl<F: Fetcher> Fetcher for ThrottledFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if let Some(host) = Self::host_key(url) {
            self.wait_for_slot(&host).await;
        }
        self.inner.fetch(url).await
    }
}

// Jitter from a time-seeded xorshift; not suitable for anything but pacing.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
