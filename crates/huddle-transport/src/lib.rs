//! # huddle-transport
//!
//! Duplex message channels and the echo relay for Huddle.
//!
//! Once a connection is validated and upgraded, the server hands the
//! upgraded socket to [`relay`], which writes every inbound data message
//! back onto the same channel until the peer leaves, an I/O error occurs,
//! or the process shuts down.
//!
//! ## Channel Abstraction
//!
//! The relay is written against the [`MessageChannel`] trait so it does not
//! care which WebSocket implementation sits underneath:
//!
//! - **AxumChannel** - sockets upgraded by the axum server
//! - **TungsteniteChannel** - any `tokio-tungstenite` stream
//!
//! ```rust,ignore
//! use huddle_transport::{relay, AxumChannel};
//!
//! async fn on_upgrade(socket: WebSocket, shutdown: CancellationToken) {
//!     let report = relay(AxumChannel::new(socket), shutdown).await;
//!     tracing::debug!(messages = report.messages, "Relay finished");
//! }
//! ```

pub mod relay;
pub mod state;
pub mod traits;

#[cfg(any(feature = "axum", feature = "tungstenite"))]
pub mod websocket;

pub use relay::{relay, relay_with, RelayEnd, RelayReport};
pub use state::ConnectionState;
pub use traits::{MessageChannel, MessageKind, RelayMessage, TransportError};

#[cfg(feature = "axum")]
pub use websocket::AxumChannel;

#[cfg(feature = "tungstenite")]
pub use websocket::TungsteniteChannel;
