//! Per-endpoint circuit breaker.
//!
//! # States
//! - Closed: no entry for the endpoint, requests pass through
//! - Open: entry present and `now < reset_at`, requests fail fast
//!
//! # State Transitions
//! ```text
//! Closed → Open: server error (5xx) observed for the endpoint
//! Open → Closed: successful response for the endpoint
//! Open → Closed: cool-down elapsed (level-triggered, checked on read)
//! ```
//!
//! # Design Decisions
//! - Per-endpoint breaker (not global)
//! - No half-open probe: the first call after the cool-down is the probe
//! - Re-opening keeps the later reset so a window is never shortened

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

/// Breaker state for a single endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CircuitState {
    pub is_open: bool,
    pub reset_at: Instant,
}

impl CircuitState {
    fn is_open_at(&self, now: Instant) -> bool {
        self.is_open && now < self.reset_at
    }
}

/// Point-in-time view of an open circuit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CircuitSnapshot {
    pub endpoint: String,
    pub remaining_ms: u64,
}

/// Circuit breakers keyed by endpoint.
#[derive(Debug)]
pub struct CircuitBreakers {
    states: DashMap<String, CircuitState>,
    cooldown: Duration,
}

impl CircuitBreakers {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            states: DashMap::new(),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_open(&self, endpoint: &str) -> bool {
        self.is_open_at(endpoint, Instant::now())
    }

    pub fn is_open_at(&self, endpoint: &str, now: Instant) -> bool {
        self.states
            .get(endpoint)
            .map(|s| s.is_open_at(now))
            .unwrap_or(false)
    }

    /// Time left before the endpoint may be called again.
    pub fn remaining(&self, endpoint: &str) -> Option<Duration> {
        self.remaining_at(endpoint, Instant::now())
    }

    pub fn remaining_at(&self, endpoint: &str, now: Instant) -> Option<Duration> {
        self.states
            .get(endpoint)
            .filter(|s| s.is_open_at(now))
            .map(|s| s.reset_at.duration_since(now))
    }

    /// Open the circuit for one cool-down window.
    pub fn open(&self, endpoint: &str) {
        self.open_at(endpoint, Instant::now());
    }

    pub fn open_at(&self, endpoint: &str, now: Instant) {
        let reset_at = now + self.cooldown;
        self.states
            .entry(endpoint.to_string())
            .and_modify(|state| {
                if !state.is_open_at(now) || state.reset_at < reset_at {
                    state.reset_at = reset_at;
                }
                state.is_open = true;
            })
            .or_insert(CircuitState {
                is_open: true,
                reset_at,
            });
    }

    /// Close the circuit. Returns true if it was open.
    pub fn close(&self, endpoint: &str) -> bool {
        self.states
            .remove(endpoint)
            .map(|(_, s)| s.is_open_at(Instant::now()))
            .unwrap_or(false)
    }

    /// Open circuits, most recently tripped last.
    pub fn snapshot(&self) -> Vec<CircuitSnapshot> {
        let now = Instant::now();
        let mut open: Vec<_> = self
            .states
            .iter()
            .filter(|r| r.value().is_open_at(now))
            .map(|r| CircuitSnapshot {
                endpoint: r.key().clone(),
                remaining_ms: r.value().reset_at.duration_since(now).as_millis() as u64,
            })
            .collect();
        open.sort_by_key(|s| s.remaining_ms);
        open
    }

    /// Drop entries whose window has passed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.states.retain(|_, s| s.is_open_at(now));
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_scoped_to_endpoint() {
        let breakers = CircuitBreakers::new(Duration::from_secs(30));
        let now = Instant::now();

        breakers.open_at("/jobs", now);

        assert!(breakers.is_open_at("/jobs", now + Duration::from_secs(1)));
        assert!(!breakers.is_open_at("/applications/my", now));
    }

    #[test]
    fn test_expires_after_cooldown() {
        let breakers = CircuitBreakers::new(Duration::from_secs(30));
        let now = Instant::now();

        breakers.open_at("/jobs", now);

        assert!(breakers.is_open_at("/jobs", now + Duration::from_secs(29)));
        assert!(!breakers.is_open_at("/jobs", now + Duration::from_secs(30)));
        assert_eq!(
            breakers.remaining_at("/jobs", now + Duration::from_secs(10)),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_reopen_never_shortens_window() {
        let breakers = CircuitBreakers::new(Duration::from_secs(30));
        let now = Instant::now();

        breakers.open_at("/jobs", now + Duration::from_secs(10));
        breakers.open_at("/jobs", now);

        assert!(breakers.is_open_at("/jobs", now + Duration::from_secs(35)));
    }

    #[test]
    fn test_close_clears_state() {
        let breakers = CircuitBreakers::new(Duration::from_secs(30));
        breakers.open("/jobs");

        assert!(breakers.close("/jobs"));
        assert!(!breakers.is_open("/jobs"));
        assert!(!breakers.close("/jobs"));
        assert!(breakers.is_empty());
    }

    #[test]
    fn test_snapshot_and_purge() {
        let breakers = CircuitBreakers::new(Duration::from_millis(1));
        breakers.open_at("/old", Instant::now() - Duration::from_secs(1));
        assert_eq!(breakers.len(), 1);
        assert!(breakers.snapshot().is_empty());

        breakers.purge_expired();
        assert!(breakers.is_empty());
    }
}
