//! Per-connection lifecycle.

use std::fmt;

/// Lifecycle state of a relayed connection.
///
/// ```text
/// Unvalidated ──▶ Upgraded ──▶ Relaying ──▶ Closed
///      │              │
///      └──────────────┴──────────────────▶ Closed
/// ```
///
/// States are never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Request received, session and client not yet checked.
    Unvalidated,
    /// Transport promoted to a duplex message channel.
    Upgraded,
    /// Echo loop running.
    Relaying,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    /// Check whether moving to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Unvalidated, Upgraded)
                | (Unvalidated, Closed)
                | (Upgraded, Relaying)
                | (Upgraded, Closed)
                | (Relaying, Closed)
        )
    }

    /// Move to `next` if the transition is legal.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    #[must_use]
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }

    /// Move to `Closed`. Every state may close, and closing twice is a no-op.
    pub fn close(&mut self) {
        *self = ConnectionState::Closed;
    }

    /// Check if the state is terminal.
    #[must_use]
    pub fn is_closed(self) -> bool {
        self == ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Unvalidated => "unvalidated",
            ConnectionState::Upgraded => "upgraded",
            ConnectionState::Relaying => "relaying",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
