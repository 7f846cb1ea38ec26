//! Channel abstraction traits for Huddle.
//!
//! These traits define the interface a duplex message channel must provide
//! so the relay can stay independent of the WebSocket implementation.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Framing kind of a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// UTF-8 text frame.
    Text,
    /// Binary frame.
    Binary,
}

impl MessageKind {
    /// Get the kind as a static label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Binary => "binary",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data message read from or written to a channel.
///
/// The framing kind travels with the payload so an echoed message is
/// identical to the one received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// Text message.
    Text(String),
    /// Binary message.
    Binary(Bytes),
}

impl RelayMessage {
    /// Get the framing kind.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            RelayMessage::Text(_) => MessageKind::Text,
            RelayMessage::Binary(_) => MessageKind::Binary,
        }
    }

    /// Get the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            RelayMessage::Text(text) => text.len(),
            RelayMessage::Binary(data) => data.len(),
        }
    }

    /// Check if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to send data.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive data.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// A message-oriented duplex channel.
///
/// Implementations consume control frames (ping, pong) themselves and only
/// surface data messages.
#[async_trait]
pub trait MessageChannel: Send {
    /// Receive the next data message.
    ///
    /// Returns `None` if the peer closed the channel cleanly.
    async fn recv(&mut self) -> Result<Option<RelayMessage>, TransportError>;

    /// Send a data message.
    async fn send(&mut self, message: RelayMessage) -> Result<(), TransportError>;

    /// Close the channel gracefully.
    async fn close(&mut self) -> Result<(), TransportError>;
}
