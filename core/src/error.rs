//! Error types for the booking API client.
//!
//! # Design
//! The taxonomy follows who can fix the problem: `Validation` is a local
//! pre-network failure the user corrects, `Remote` is a well-formed request
//! the server rejected (message passed through verbatim), `Network` means no
//! response arrived at all. `Serialization`/`Deserialization` cover payloads
//! and bodies that do not match the wire schema.

use std::fmt;

/// Errors returned by the booking, search and lifecycle-manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The input failed local validation; no network call was made.
    Validation(String),

    /// The server answered with a non-2xx status. The message is taken from
    /// the response body where present, else derived from the status code.
    Remote { status: u16, message: String },

    /// No response from the server at all (connection refused, DNS, ...).
    Network(String),

    /// The request payload could not be serialized to JSON.
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    Deserialization(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "{msg}"),
            // The status stays on the variant; the user-facing text is the
            // server's own message.
            ApiError::Remote { message, .. } => write!(f, "{message}"),
            ApiError::Network(msg) => {
                write!(f, "no response from server: {msg}")
            }
            ApiError::Serialization(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
