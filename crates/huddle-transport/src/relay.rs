//! The echo relay.
//!
//! A relay owns one upgraded channel and writes every data message it reads
//! back onto that same channel, unmodified. It never reaches other
//! connections: there is no fan-out between participants of a session.

use crate::state::ConnectionState;
use crate::traits::{MessageChannel, MessageKind, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Why a relay stopped.
#[derive(Debug)]
pub enum RelayEnd {
    /// The peer closed the channel.
    PeerClosed,
    /// A read or write failed.
    Failed(TransportError),
    /// The process is shutting down.
    Shutdown,
    /// The connection was not upgraded when handed to the relay.
    NotUpgraded(ConnectionState),
}

/// Summary of a finished relay.
#[derive(Debug)]
pub struct RelayReport {
    /// Why the relay stopped.
    pub end: RelayEnd,
    /// Number of messages echoed.
    pub messages: u64,
    /// Payload bytes echoed.
    pub bytes: u64,
    /// Connection state when the relay returned. Always `Closed`.
    pub state: ConnectionState,
}

/// Echo messages on `channel` until it closes, fails, or `shutdown` fires.
///
/// The channel is dropped when this returns.
pub async fn relay<C: MessageChannel>(channel: C, shutdown: CancellationToken) -> RelayReport {
    relay_with(channel, ConnectionState::Upgraded, shutdown, |_, _| {}).await
}

/// Like [`relay`] for a connection whose lifecycle is tracked by the caller.
///
/// `state` must be `Upgraded`; any other state ends the relay at once with
/// [`RelayEnd::NotUpgraded`]. `on_echo` is called with the kind and size of
/// every message after it has been written back.
pub async fn relay_with<C, F>(
    mut channel: C,
    mut state: ConnectionState,
    shutdown: CancellationToken,
    mut on_echo: F,
) -> RelayReport
where
    C: MessageChannel,
    F: FnMut(MessageKind, usize) + Send,
{
    if !state.advance(ConnectionState::Relaying) {
        warn!(state = %state, "Relay refused for connection that is not upgraded");
        let end = RelayEnd::NotUpgraded(state);
        state.close();
        return RelayReport {
            end,
            messages: 0,
            bytes: 0,
            state,
        };
    }
    trace!(state = %state, "Relay started");

    let mut messages = 0u64;
    let mut bytes = 0u64;

    let end = loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Shutdown requested, closing channel");
                if let Err(e) = channel.close().await {
                    debug!(error = %e, "Close on shutdown failed");
                }
                break RelayEnd::Shutdown;
            }

            msg = channel.recv() => {
                match msg {
                    Ok(Some(message)) => {
                        let kind = message.kind();
                        let len = message.len();

                        if let Err(e) = channel.send(message).await {
                            warn!(error = %e, "Echo write failed");
                            break RelayEnd::Failed(e);
                        }

                        messages += 1;
                        bytes += len as u64;
                        on_echo(kind, len);
                    }
                    Ok(None) => break RelayEnd::PeerClosed,
                    Err(e) => {
                        warn!(error = %e, "Echo read failed");
                        break RelayEnd::Failed(e);
                    }
                }
            }
        }
    };

    state.close();
    debug!(state = %state, messages, bytes, "Relay finished");

    RelayReport {
        end,
        messages,
        bytes,
        state,
    }
}
