//! Per-client sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Sliding-window log limiter keyed by client identity.
///
/// Each key keeps the admission times still inside the window. The DashMap
/// entry guard holds the shard lock for the whole check-and-record, so
/// concurrent checks for one key are serialized and never double-count.
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    limit: u32,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
            enabled: true,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(
                config.requests_per_window,
                Duration::from_secs(config.window_secs),
            )
        }
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(u32::MAX, Duration::from_secs(60))
        }
    }

    /// Admit or deny one request for `key`.
    pub fn allow(&self, key: &str) -> bool {
        self.check(key).is_allowed()
    }

    /// Admit or deny one request for `key`, reporting when to retry.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed {
                remaining: u32::MAX,
            };
        }

        let mut entry = self.windows.entry(key.to_string()).or_default();
        let log = entry.value_mut();
        expire(log, now, self.window);

        let used = log.len() as u32;
        if used < self.limit {
            log.push_back(now);
            RateDecision::Allowed {
                remaining: self.limit - used - 1,
            }
        } else {
            let retry_after = log
                .front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(self.window);
            RateDecision::Limited { retry_after }
        }
    }

    /// Drop keys with no admissions left in the window. Returns how many
    /// keys were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    fn prune_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, log| {
            expire(log, now, self.window);
            !log.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Human-readable limit, e.g. "10 per 1 minute".
    pub fn describe(&self) -> String {
        format!("{} per {}", self.limit, window_label(self.window.as_secs()))
    }
}

fn expire(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = log.front() {
        if now.saturating_duration_since(*oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

fn window_label(secs: u64) -> String {
    let (n, unit) = if secs != 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs != 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
