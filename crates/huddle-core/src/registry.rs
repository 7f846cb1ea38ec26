//! Session registry for Huddle.
//!
//! The registry owns every session for the lifetime of the process and is
//! shared between request handlers and connection validation.

use crate::client::Client;
use crate::id::new_id;
use crate::session::{Session, SessionId};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Client not found in the session.
    #[error("Client {client_id} not found in session {session_id}")]
    ClientNotFound {
        /// Session that was searched.
        session_id: String,
        /// Client that was missing.
        client_id: String,
    },
}

impl RegistryError {
    /// Whether this error means a lookup target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SessionNotFound(_) | RegistryError::ClientNotFound { .. }
        )
    }
}

/// The process-wide session registry.
///
/// Sessions are only ever added. Lookups hand out an `Arc<Session>` so a
/// caller never holds a map shard lock while working with a session.
pub struct Registry {
    /// Sessions indexed by identifier.
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            session_count: self.sessions.len(),
            client_count: self.sessions.iter().map(|s| s.client_count()).sum(),
        }
    }

    /// Create a new, empty session and return its identifier.
    pub fn create_session(&self) -> SessionId {
        let id = new_id();
        self.sessions
            .insert(id.clone(), Arc::new(Session::new(id.clone())));

        debug!(session = %id, sessions = self.sessions.len(), "Created session");

        id
    }

    /// Look up a session.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SessionNotFound`] if no session has this id.
    pub fn get_session(&self, session_id: &str) -> Result<Arc<Session>, RegistryError> {
        self.sessions
            .get(session_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))
    }

    /// Join a session by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SessionNotFound`] if the session does not exist.
    pub fn join(&self, session_id: &str, name: impl Into<String>) -> Result<Client, RegistryError> {
        Ok(self.get_session(session_id)?.join(name))
    }

    /// Check that a client belongs to a session.
    ///
    /// The session is checked first, so an unknown session is always
    /// reported as [`RegistryError::SessionNotFound`] regardless of the
    /// client id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing session or client.
    pub fn validate(&self, session_id: &str, client_id: &str) -> Result<Client, RegistryError> {
        let session = self.get_session(session_id)?;

        session
            .client(client_id)
            .ok_or_else(|| RegistryError::ClientNotFound {
                session_id: session_id.to_string(),
                client_id: client_id.to_string(),
            })
    }

    /// Check if a session exists.
    #[must_use]
    pub fn session_exists(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Get the number of sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of sessions.
    pub session_count: usize,
    /// Number of clients across all sessions.
    pub client_count: usize,
}
