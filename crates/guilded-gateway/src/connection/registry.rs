//! Session registry
//!
//! At most one live session per key: the main gateway plus one per team.

use std::fmt;

use dashmap::DashMap;

use super::SessionHandle;

/// Identifies a session slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Main,
    Team(String),
}

impl SessionKey {
    pub fn team_id(&self) -> Option<&str> {
        match self {
            Self::Main => None,
            Self::Team(team_id) => Some(team_id),
        }
    }

    /// Thread-name friendly label: `main` or the team id
    pub fn label(&self) -> String {
        match self {
            Self::Main => "main".to_string(),
            Self::Team(team_id) => team_id.clone(),
        }
    }

    /// Event published when this session (re)connects
    pub fn connect_event(&self) -> &'static str {
        match self {
            Self::Main => "connect",
            Self::Team(_) => "team_connect",
        }
    }

    /// Event published when this session drops
    pub fn disconnect_event(&self) -> &'static str {
        match self {
            Self::Main => "disconnect",
            Self::Team(_) => "team_disconnect",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Team(team_id) => write!(f, "team:{team_id}"),
        }
    }
}

/// Live sessions by key
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session, returning the one it superseded
    pub fn insert(&self, handle: SessionHandle) -> Option<SessionHandle> {
        let key = handle.key().clone();
        let previous = self.sessions.insert(key.clone(), handle);
        if previous.is_some() {
            tracing::debug!(session = %key, "Superseded registered session");
        }
        previous
    }

    pub fn remove(&self, key: &SessionKey) -> Option<SessionHandle> {
        self.sessions.remove(key).map(|(_, handle)| handle)
    }

    pub fn get(&self, key: &SessionKey) -> Option<SessionHandle> {
        self.sessions.get(key).map(|r| r.clone())
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn keys(&self) -> Vec<SessionKey> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    /// Remove and return every session
    pub fn drain(&self) -> Vec<SessionHandle> {
        self.keys().iter().filter_map(|key| self.remove(key)).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
