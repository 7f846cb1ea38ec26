//! Opaque identifier generation.

use uuid::Uuid;

/// Generate a new opaque identifier.
///
/// Identifiers are random 128-bit UUIDs (v4) in canonical hyphenated form.
/// No ordering exists between successive calls.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
