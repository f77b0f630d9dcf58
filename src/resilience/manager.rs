//! Shared per-endpoint resilience state.

use std::time::Duration;

use serde::Serialize;

use crate::config::{CircuitBreakerConfig, RateLimitConfig};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{CircuitBreakers, CircuitSnapshot};
use crate::resilience::rate_limit::{RateLimitSnapshot, RateLimits};

/// Why a request was refused before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    CircuitOpen { retry_in: Duration },
    RateLimited { retry_in: Duration },
}

/// State consulted before every dispatch and updated after every response.
///
/// One instance is owned by each client through an `Arc`; clients that
/// should share breaker state are built with the same manager.
#[derive(Debug)]
pub struct RequestManager {
    circuits: CircuitBreakers,
    rate_limits: RateLimits,
    circuit_enabled: bool,
    rate_limit_enabled: bool,
}

/// Serializable state dump.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerSnapshot {
    pub open_circuits: Vec<CircuitSnapshot>,
    pub rate_limited: Vec<RateLimitSnapshot>,
}

impl RequestManager {
    pub fn new(circuit: &CircuitBreakerConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            circuits: CircuitBreakers::new(circuit.cooldown()),
            rate_limits: RateLimits::new(),
            circuit_enabled: circuit.enabled,
            rate_limit_enabled: rate_limit.enabled,
        }
    }

    pub fn circuits(&self) -> &CircuitBreakers {
        &self.circuits
    }

    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    /// Gate decision for `endpoint`. The circuit is checked first.
    pub fn check(&self, endpoint: &str) -> Result<(), GateRejection> {
        if let Some(retry_in) = self.circuits.remaining(endpoint) {
            metrics::record_gate_rejection("circuit_open");
            return Err(GateRejection::CircuitOpen { retry_in });
        }
        if let Some(retry_in) = self.rate_limits.remaining(endpoint) {
            metrics::record_gate_rejection("rate_limited");
            return Err(GateRejection::RateLimited { retry_in });
        }
        Ok(())
    }

    pub fn record_success(&self, endpoint: &str) {
        if self.circuits.close(endpoint) {
            tracing::info!(endpoint = %endpoint, "Circuit closed after successful response");
        }
    }

    pub fn record_server_error(&self, endpoint: &str) {
        if !self.circuit_enabled {
            return;
        }
        self.circuits.open(endpoint);
        metrics::record_circuit_opened();
        tracing::warn!(
            endpoint = %endpoint,
            cooldown_ms = self.circuits.cooldown().as_millis() as u64,
            "Circuit opened after server error"
        );
    }

    pub fn record_rate_limit(&self, endpoint: &str, reset_epoch_secs: u64) {
        if !self.rate_limit_enabled {
            return;
        }
        if self.rate_limits.record(endpoint, reset_epoch_secs) {
            tracing::warn!(endpoint = %endpoint, reset = reset_epoch_secs, "Rate limit recorded");
        } else {
            tracing::debug!(endpoint = %endpoint, reset = reset_epoch_secs, "Ignoring out-of-range rate limit reset");
        }
    }

    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            open_circuits: self.circuits.snapshot(),
            rate_limited: self.rate_limits.snapshot(),
        }
    }

    pub fn purge_expired(&self) {
        self.circuits.purge_expired();
        self.rate_limits.purge_expired();
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new(&CircuitBreakerConfig::default(), &RateLimitConfig::default())
    }
}
