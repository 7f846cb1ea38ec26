//! # huddle-protocol
//!
//! Wire types for the Huddle session API.
//!
//! Every request and response body is a UTF-8 JSON object. Field names are
//! part of the contract and never change.
//!
//! ## Messages
//!
//! - `CreateSessionResponse` - `{"id"}` returned by session creation
//! - `JoinSessionRequest` - `{"name"}` sent to join a session
//! - `JoinSessionResponse` - `{"id", "name"}` identity of the joined client
//!
//! ## Example
//!
//! ```rust
//! use huddle_protocol::{codec, JoinSessionRequest};
//!
//! let request: JoinSessionRequest = codec::decode(br#"{"name":"alice"}"#).unwrap();
//! assert_eq!(request.name, "alice");
//! ```

pub mod codec;
pub mod messages;

pub use codec::{decode, encode, ProtocolError, CONTENT_TYPE, MAX_BODY_SIZE};
pub use messages::{CreateSessionResponse, JoinSessionRequest, JoinSessionResponse};
