//! Session token storage.
//!
//! # Responsibilities
//! - Hold the access token, refresh token and cached user profile
//! - Optionally persist them so a CLI session survives between runs
//!
//! # Design Decisions
//! - Stores are synchronous; every operation is a short critical section
//! - Persistence failures are logged, never surfaced to the request path

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Credentials for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// Access token usable as a bearer credential. Empty strings and the
    /// literals `undefined` and `null` count as absent.
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "undefined" && *t != "null")
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

/// Where the client keeps its session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Session;

    fn store(&self, session: Session);

    fn access_token(&self) -> Option<String> {
        self.load().bearer_token().map(str::to_string)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().refresh_token().map(str::to_string)
    }

    /// Replace only the access token, keeping the rest of the session.
    fn set_access_token(&self, token: &str) {
        let mut session = self.load();
        session.access_token = Some(token.to_string());
        self.store(session);
    }

    fn clear(&self) {
        self.store(Session::default());
    }
}

/// Session held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, session: Session) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

/// Session mirrored to a JSON file on every change.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    memory: MemorySessionStore,
}

impl FileSessionStore {
    /// Open `path`, loading the stored session when the file exists.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let session = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let session: Session = serde_json::from_reader(reader)?;
            tracing::debug!(path = %path.display(), "Loaded session file");
            session
        } else {
            Session::default()
        };
        Ok(Self {
            path,
            memory: MemorySessionStore::with_session(session),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, session: &Session) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, session)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Session {
        self.memory.load()
    }

    fn store(&self, session: Session) {
        if let Err(e) = self.persist(&session) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist session");
        }
        self.memory.store(session);
    }
}
