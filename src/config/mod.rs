//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (JOBPORTAL_*)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to ApiClient::builder
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is valid
//! - Environment wins over the file, matching how deployments inject URLs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, CircuitBreakerConfig, ClientConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, RetryConfig, SessionConfig,
};
pub use validation::ValidationError;
