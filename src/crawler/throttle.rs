//! Per-host request throttling
//!
//! Workers share one [`HostThrottle`]. Requests to the same host are
//! serialized and spaced at least `min-host-delay-ms` apart. A host that
//! answers HTTP 429 gets its delay doubled for the rest of the crawl.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on the doubling applied after repeated 429 responses
const MAX_PENALTY: u32 = 6;

/// Tracks the request history of a single host
#[derive(Debug, Clone, Default)]
struct HostState {
    /// Timestamp of the last request to this host
    last_request_time: Option<Instant>,

    /// How many times the delay has been doubled (HTTP 429)
    penalty: u32,
}

impl HostState {
    fn effective_delay(&self, base: Duration) -> Duration {
        base.saturating_mul(1 << self.penalty)
    }

    /// Returns None if a request can be made now, or the duration to wait otherwise
    fn time_until_next_request(&self, base: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let min_delay = self.effective_delay(base);
        let elapsed = now.saturating_duration_since(last);
        (elapsed < min_delay).then(|| min_delay - elapsed)
    }

    fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }
}

/// Shared politeness gate keyed by host name
#[derive(Debug)]
pub struct HostThrottle {
    min_delay: Duration,
    hosts: Mutex<HashMap<String, Arc<tokio::sync::Mutex<HostState>>>>,
}

impl HostThrottle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, host: &str) -> Arc<tokio::sync::Mutex<HostState>> {
        let mut hosts = match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hosts
            .entry(host.to_lowercase())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(HostState::default())))
            .clone()
    }

    /// Waits until a request to `host` is allowed, then records it
    ///
    /// Concurrent callers for the same host queue up behind each other;
    /// different hosts never block one another.
    pub async fn acquire(&self, host: &str) {
        let slot = self.slot(host);
        let mut state = slot.lock().await;

        if let Some(wait) = state.time_until_next_request(self.min_delay, Instant::now()) {
            tracing::trace!(host, wait_ms = wait.as_millis() as u64, "Waiting for host delay");
            tokio::time::sleep(wait).await;
        }

        state.record_request(Instant::now());
    }

    /// Doubles the delay for `host` after an HTTP 429 response
    pub async fn mark_rate_limited(&self, host: &str) {
        let slot = self.slot(host);
        let mut state = slot.lock().await;
        if state.penalty < MAX_PENALTY {
            state.penalty += 1;
        }
        tracing::warn!(
            host,
            delay_ms = state.effective_delay(self.min_delay).as_millis() as u64,
            "Host is rate limiting, backing off"
        );
    }

    /// Current spacing between requests to `host`
    #[cfg(test)]
    pub(crate) async fn delay_for(&self, host: &str) -> Duration {
        let slot = self.slot(host);
        let state = slot.lock().await;
        state.effective_delay(self.min_delay)
    }
}
