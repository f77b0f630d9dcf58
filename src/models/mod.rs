//! Wire types exchanged with the job portal backend.

pub mod application;
pub mod envelope;
pub mod file;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationStatus, ApplyRequest, StatusUpdate};
pub use envelope::ApiEnvelope;
pub use file::FileUploadResponse;
pub use job::{Job, JobRequest, JobSearchFilters};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User, UserRole};
