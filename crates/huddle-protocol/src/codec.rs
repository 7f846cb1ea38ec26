//! JSON codec for Huddle request and response bodies.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Maximum accepted request body size (64 KiB).
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Content type of every encoded body.
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Body exceeds maximum size.
    #[error("Body size {0} exceeds maximum {MAX_BODY_SIZE}")]
    BodyTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a message as a JSON object.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, ProtocolError> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(ProtocolError::Encode)
}

/// Decode a message from a JSON body.
///
/// Partial parses are never accepted: trailing garbage, missing required
/// fields and oversized bodies are all errors.
///
/// # Errors
///
/// Returns an error if the body is too large or is not a valid message.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.len() > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge(data.len()));
    }

    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}
