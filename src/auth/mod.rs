//! Authentication state shared by every request.
//!
//! The client reads the access token from a [`SessionStore`] before each
//! dispatch, replaces it after a successful refresh and clears it when the
//! server rejects credentials that cannot be refreshed.

pub mod events;
pub mod session;

pub use events::{SessionEvent, SessionEvents};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
