//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every dispatch produces:
//!     → logging.rs (structured events carrying request_id, method, endpoint)
//!     → metrics.rs (counters and latency histogram)
//!
//! Consumers:
//!     → stderr (pretty or compact)
//!     → Prometheus scrape (optional exporter)
//! ```
//!
//! # Design Decisions
//! - The request ID sent as X-Request-ID is the correlation key in logs
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
