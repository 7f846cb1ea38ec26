//! Session participants.

use serde::Serialize;

/// A client identifier.
pub type ClientId = String;

/// A named participant that joined a session.
///
/// Clients are immutable after creation and owned by the session they
/// joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    id: ClientId,
    name: String,
}

impl Client {
    /// Create a client with the given identifier and display name.
    #[must_use]
    pub fn new(id: impl Into<ClientId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Get the client identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the display name the client joined with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
