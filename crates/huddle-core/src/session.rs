//! Session abstraction for Huddle.
//!
//! Sessions are rooms that clients join by name to obtain an identity.

use crate::client::{Client, ClientId};
use crate::id::new_id;
use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// A session identifier.
pub type SessionId = String;

/// A room that clients join.
///
/// The client map only ever grows. It is safe to call [`Session::join`]
/// from many tasks at once.
#[derive(Debug)]
pub struct Session {
    /// Session identifier.
    id: SessionId,
    /// Joined clients indexed by identifier.
    clients: DashMap<ClientId, Client>,
    /// When the session was created.
    created_at: Instant,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            clients: DashMap::new(),
            created_at: Instant::now(),
        }
    }

    /// Get the session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the creation time.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Join this session under the given name.
    ///
    /// Any name is accepted, including the empty string and names already
    /// used by other clients. Each call allocates a fresh client identity.
    pub fn join(&self, name: impl Into<String>) -> Client {
        let client = Client::new(new_id(), name);
        self.clients.insert(client.id().to_string(), client.clone());

        debug!(
            session = %self.id,
            client = %client.id(),
            clients = self.clients.len(),
            "Client joined"
        );

        client
    }

    /// Check if a client belongs to this session.
    #[must_use]
    pub fn has_client(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Look up a client by identifier.
    #[must_use]
    pub fn client(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).map(|c| c.value().clone())
    }

    /// Get the number of joined clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Snapshot of all joined clients, in no particular order.
    #[must_use]
    pub fn clients(&self) -> Vec<Client> {
        self.clients.iter().map(|c| c.value().clone()).collect()
    }
}
