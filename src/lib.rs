//! Resilient client for the job portal REST API.
//!
//! Every call goes through one pipeline: a per-endpoint circuit breaker and
//! rate-limit gate, standard and credential headers, the transport, then
//! response tracking. Expired access tokens are refreshed once, calls that
//! get no response are retried with linear backoff, and failures come back
//! as an [`ApiError`] carrying a message fit for display.
//!
//! ```no_run
//! use jobportal_client::{ApiClient, ClientConfig};
//!
//! # async fn run() -> jobportal_client::ApiResult<()> {
//! let client = ApiClient::new(ClientConfig::default())?;
//! let page = client.jobs().list(0, 10).await?;
//! println!("{} jobs, cached: {}", page.data.total.unwrap_or(0), page.is_cached());
//! # Ok(())
//! # }
//! ```

// Core
pub mod config;
pub mod error;
pub mod http;

// Shared state
pub mod auth;
pub mod resilience;

// Surfaces
pub mod api;
pub mod matching;
pub mod models;

// Cross-cutting concerns
pub mod observability;

pub use auth::{SessionEvent, SessionStore};
pub use config::{load_config, ClientConfig};
pub use error::{ApiError, ApiResult, ErrorKind, ErrorReport};
pub use http::{ApiClient, ApiResponse};
pub use resilience::RequestManager;
