//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Before dispatch:
//!     → manager.rs (circuit open? rate limited? fail fast, no network call)
//! After response:
//!     → 2xx: circuit_breaker.rs closes the endpoint's circuit
//!     → 5xx: circuit_breaker.rs opens it for the cool-down
//!     → 429: rate_limit.rs records the server's reset time
//! No response:
//!     → retries.rs + backoff.rs (bounded linear retry)
//! ```
//!
//! # Design Decisions
//! - State is keyed by endpoint path (query string excluded)
//! - Both maps are level-triggered by time comparison; no transition table
//! - State lives in memory for the life of the process only

pub mod backoff;
pub mod circuit_breaker;
pub mod manager;
pub mod rate_limit;
pub mod retries;

pub use manager::{GateRejection, ManagerSnapshot, RequestManager};
pub use retries::RetryPolicy;
