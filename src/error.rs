//! # Error Types
//!
//! Typed errors surfaced by the SDK's public entry points using `thiserror`.
//!
//! Public methods never panic and never propagate internal errors raw: the
//! host always receives one of the variants below.

use thiserror::Error;

/// Errors returned by public SDK entry points.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The configured API key does not carry the `pk_` prefix.
    #[error("invalid API key: expected a key starting with \"pk_\"")]
    InvalidApiKey,

    /// A session operation was attempted from the wrong state.
    #[error("invalid session state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Stop or flush was requested while no session is active.
    #[error("no active session")]
    NoActiveSession,

    /// A remote call failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The on-device batch store failed to open or answer.
    #[error("storage error: {cause}")]
    Storage { cause: String },
}

impl TrackerError {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        TrackerError::Storage {
            cause: format!("{err:#}"),
        }
    }
}

/// Failures of a single HTTP request-response exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("server returned {code} for {url}")]
    StatusCode {
        code: u16,
        url: String,
        /// First bytes of the response body, for diagnostics only.
        body_preview: String,
    },

    /// The request never completed: DNS, connect, TLS, timeout, reset.
    #[error("network error: {cause}")]
    Network { cause: String },

    /// The response arrived but its body could not be decoded.
    #[error("failed to decode response body")]
    Decoding,

    /// The response decoded but did not match the expected shape.
    #[error("unexpected response shape")]
    InvalidResponse,
}

impl TransportError {
    /// Status code carried by this error, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::StatusCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result alias used across the crate's public surface.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
