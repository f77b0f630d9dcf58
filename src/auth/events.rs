//! Session lifecycle notifications.

use tokio::sync::broadcast;

/// Something happened to the signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    TokenRefreshed,
    /// Credentials were rejected and could not be refreshed. The caller
    /// should send the user back to the login flow.
    LoginRequired { request_id: String },
}

/// Broadcast channel for [`SessionEvent`]s.
///
/// Events sent with no subscribers are dropped.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
