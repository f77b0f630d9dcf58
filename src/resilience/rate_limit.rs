//! Client-side rate-limit suppression.
//!
//! When the server answers 429 with `x-ratelimit-reset`, further calls to the
//! same endpoint are refused locally until that time. Entries expire on read;
//! `purge_expired` garbage-collects them.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;

/// Point-in-time view of a suppressed endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub endpoint: String,
    /// Reset time in seconds since epoch.
    pub reset: u64,
}

/// Server-announced reset times keyed by endpoint.
#[derive(Debug, Default)]
pub struct RateLimits {
    resets: DashMap<String, SystemTime>,
}

impl RateLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_limited(&self, endpoint: &str) -> bool {
        self.is_limited_at(endpoint, SystemTime::now())
    }

    pub fn is_limited_at(&self, endpoint: &str, now: SystemTime) -> bool {
        self.resets
            .get(endpoint)
            .map(|reset| now < *reset)
            .unwrap_or(false)
    }

    pub fn remaining(&self, endpoint: &str) -> Option<Duration> {
        self.remaining_at(endpoint, SystemTime::now())
    }

    pub fn remaining_at(&self, endpoint: &str, now: SystemTime) -> Option<Duration> {
        self.resets
            .get(endpoint)
            .and_then(|reset| reset.duration_since(now).ok())
            .filter(|d| !d.is_zero())
    }

    /// Record a reset time given in seconds since epoch. A later reset already
    /// on record is kept. Returns `false` when the value is not a
    /// representable time, in which case nothing is recorded.
    pub fn record(&self, endpoint: &str, reset_epoch_secs: u64) -> bool {
        let Some(reset) = UNIX_EPOCH.checked_add(Duration::from_secs(reset_epoch_secs)) else {
            return false;
        };
        self.resets
            .entry(endpoint.to_string())
            .and_modify(|current| {
                if *current < reset {
                    *current = reset;
                }
            })
            .or_insert(reset);
        true
    }

    pub fn snapshot(&self) -> Vec<RateLimitSnapshot> {
        let now = SystemTime::now();
        let mut active: Vec<_> = self
            .resets
            .iter()
            .filter(|r| now < *r.value())
            .map(|r| RateLimitSnapshot {
                endpoint: r.key().clone(),
                reset: r
                    .value()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
            })
            .collect();
        active.sort_by_key(|s| s.reset);
        active
    }

    pub fn purge_expired(&self) {
        let now = SystemTime::now();
        self.resets.retain(|_, reset| now < *reset);
    }

    pub fn len(&self) -> usize {
        self.resets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resets.is_empty()
    }
}

/// Parse a seconds-since-epoch header value.
pub fn parse_reset_header(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
