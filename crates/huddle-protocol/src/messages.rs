//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Response to a session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Identifier of the new session.
    pub id: String,
}

/// Body of a join request.
///
/// A missing `name` joins with an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionRequest {
    /// Display name for the joining client.
    #[serde(default)]
    pub name: String,
}

/// Response to a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionResponse {
    /// Identifier of the new client.
    pub id: String,
    /// Display name the client joined with.
    pub name: String,
}

impl CreateSessionResponse {
    /// Create a response for the given session.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl JoinSessionRequest {
    /// Create a join request.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl JoinSessionResponse {
    /// Create a response for the given client.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
