//! Error types for the library catalog client.
//!
//! # Design
//! Variants fall into three groups. `Resolve` and `Connect` mean the
//! service cannot be reached at all and end the process (see
//! [`ApiError::is_fatal`]). `NotLoggedIn` and `NotInLibrary` are raised before
//! any socket is opened. Everything else is scoped to the one operation that
//! produced it and leaves the session untouched.

use std::io;

/// Errors returned by the request builders, the transport and the parsers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The host name did not resolve to any IPv4 address.
    #[error("could not resolve {host} to an IPv4 address")]
    Resolve { host: String },

    /// The socket could not be created or connected.
    #[error("couldn't connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A read or write failed mid-operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer stopped accepting bytes before the request was fully written.
    #[error("connection closed after {sent} of {total} request bytes")]
    ConnectionClosed { sent: usize, total: usize },

    /// The raw response could not be decomposed into a status line and headers.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The service answered with a non-2xx status.
    #[error("request failed ({status}){}", suffix(.message))]
    HttpError {
        status: u16,
        message: Option<String>,
    },

    /// A body declared as JSON could not be parsed.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A request body could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("Login into the account first!")]
    NotLoggedIn,

    #[error("Enter the library first!")]
    NotInLibrary,

    /// Library access was granted but the response carried no token.
    #[error("library access response carried no token")]
    MissingToken,
}

fn suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    /// Whether the error should terminate the client instead of returning
    /// to the prompt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Resolve { .. } | ApiError::Connect { .. })
    }

    /// Whether the error was raised by a session precondition, before any
    /// network activity.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ApiError::NotLoggedIn | ApiError::NotInLibrary)
    }
}
