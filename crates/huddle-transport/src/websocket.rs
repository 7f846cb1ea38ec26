//! WebSocket channel adapters.
//!
//! [`AxumChannel`] wraps sockets upgraded by axum and [`TungsteniteChannel`]
//! wraps any `tokio-tungstenite` stream. Both answer pings inside the
//! WebSocket library and only surface text and binary messages.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::traits::{MessageChannel, RelayMessage, TransportError};

#[cfg(feature = "axum")]
use axum::extract::ws::{Message as AxumMessage, WebSocket};

#[cfg(feature = "tungstenite")]
use futures_util::{SinkExt, StreamExt};
#[cfg(feature = "tungstenite")]
use tokio::io::{AsyncRead, AsyncWrite};
#[cfg(feature = "tungstenite")]
use tokio_tungstenite::{
    tungstenite::{Error as WsError, Message},
    WebSocketStream,
};

/// A channel over a socket upgraded by axum.
#[cfg(feature = "axum")]
pub struct AxumChannel {
    socket: WebSocket,
}

#[cfg(feature = "axum")]
impl AxumChannel {
    /// Wrap an upgraded socket.
    #[must_use]
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[cfg(feature = "axum")]
#[async_trait]
impl MessageChannel for AxumChannel {
    async fn recv(&mut self) -> Result<Option<RelayMessage>, TransportError> {
        loop {
            match self.socket.recv().await {
                Some(Ok(AxumMessage::Text(text))) => return Ok(Some(RelayMessage::Text(text))),
                Some(Ok(AxumMessage::Binary(data))) => {
                    return Ok(Some(RelayMessage::Binary(Bytes::from(data))))
                }
                Some(Ok(AxumMessage::Ping(_))) | Some(Ok(AxumMessage::Pong(_))) => {
                    trace!("Control frame");
                }
                Some(Ok(AxumMessage::Close(_))) => {
                    debug!("Received close frame");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                None => {
                    debug!("WebSocket stream ended");
                    return Ok(None);
                }
            }
        }
    }

    async fn send(&mut self, message: RelayMessage) -> Result<(), TransportError> {
        let message = match message {
            RelayMessage::Text(text) => AxumMessage::Text(text),
            RelayMessage::Binary(data) => AxumMessage::Binary(data.to_vec()),
        };

        self.socket
            .send(message)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.socket
            .send(AxumMessage::Close(None))
            .await
            .map_err(|e| TransportError::Other(format!("Failed to close: {}", e)))
    }
}

/// A channel over a `tokio-tungstenite` stream.
#[cfg(feature = "tungstenite")]
pub struct TungsteniteChannel<S> {
    stream: WebSocketStream<S>,
}

#[cfg(feature = "tungstenite")]
impl<S> TungsteniteChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established WebSocket stream.
    #[must_use]
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }

    /// Unwrap the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> WebSocketStream<S> {
        self.stream
    }
}

#[cfg(feature = "tungstenite")]
#[async_trait]
impl<S> MessageChannel for TungsteniteChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<RelayMessage>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(RelayMessage::Text(text))),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(RelayMessage::Binary(Bytes::from(data))))
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    trace!("Control frame");
                }
                Some(Ok(Message::Frame(_))) => {
                    // Raw frame, ignore
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("Received close frame");
                    return Ok(None);
                }
                Some(Err(WsError::ConnectionClosed)) | Some(Err(WsError::AlreadyClosed)) => {
                    debug!("Connection closed");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                None => {
                    debug!("WebSocket stream ended");
                    return Ok(None);
                }
            }
        }
    }

    async fn send(&mut self, message: RelayMessage) -> Result<(), TransportError> {
        let message = match message {
            RelayMessage::Text(text) => Message::Text(text),
            RelayMessage::Binary(data) => Message::Binary(data.to_vec()),
        };

        self.stream.send(message).await.map_err(|e| match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::ConnectionClosed,
            e => TransportError::SendFailed(e.to_string()),
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Other(format!("Failed to close: {}", e)))
    }
}
