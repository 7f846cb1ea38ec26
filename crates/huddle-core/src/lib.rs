//! # huddle-core
//!
//! Core types for the Huddle session broker.
//!
//! This crate provides the in-memory state that every request touches:
//!
//! - **Registry** - Process-wide owner of all sessions
//! - **Session** - A room holding the clients that joined it
//! - **Client** - A named participant bound to exactly one session
//! - **id** - Opaque identifier generation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│   Session   │────▶│   Client    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! All state is append-only: sessions and clients are never removed once
//! created, and live until the registry is dropped.

pub mod client;
pub mod id;
pub mod registry;
pub mod session;

pub use client::{Client, ClientId};
pub use id::new_id;
pub use registry::{Registry, RegistryError, RegistryStats};
pub use session::{Session, SessionId};
