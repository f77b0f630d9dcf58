//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! ApiClient::execute(PendingRequest)
//!     → request.rs (request ID, endpoint key, body)
//!     → hooks.rs (gate, headers, credentials)
//!     → reqwest transport
//!     → hooks.rs (circuit, rate limit, metrics)
//!     → client.rs (401 refresh, network retries, classification)
//!     → response.rs (ApiResponse with metadata)
//! ```

pub mod client;
pub mod hooks;
pub mod request;
pub mod response;

pub use client::{ApiClient, ApiClientBuilder};
pub use hooks::{DispatchOutcome, PostDispatchHook, PreDispatchHook};
pub use request::{FilePart, PendingRequest, RequestBody, RequestContext, X_REQUEST_ID};
pub use response::{measure, ApiResponse, Measured, RateLimitInfo, RawResponse, ResponseMeta};
