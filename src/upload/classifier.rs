//! Upload outcome classification.
//!
//! Every transport result maps to exactly one of three outcomes, and the
//! live path and the retry sweep share this single table so crash recovery
//! inherits the full policy.

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Batch delivered; delete the persisted row.
    Success,
    /// Transient failure; keep the row and bump its attempt count.
    Retryable,
    /// The server rejected the payload; retrying cannot help. Includes 429:
    /// this SDK backs off entirely rather than add load while rate-limited.
    Permanent,
}

impl UploadOutcome {
    pub fn from_status(code: u16) -> Self {
        match code {
            200..=299 => UploadOutcome::Success,
            400..=499 => UploadOutcome::Permanent,
            _ => UploadOutcome::Retryable,
        }
    }

    /// Classifies a completed upload attempt. Transport errors without a
    /// status (DNS, timeout, reset, TLS) and undecodable responses are all
    /// retryable.
    pub fn classify<T>(result: &Result<T, TransportError>) -> Self {
        match result {
            Ok(_) => UploadOutcome::Success,
            Err(TransportError::StatusCode { code, .. }) => Self::from_status(*code),
            Err(TransportError::Network { .. })
            | Err(TransportError::Decoding)
            | Err(TransportError::InvalidResponse) => UploadOutcome::Retryable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadOutcome::Success => "success",
            UploadOutcome::Retryable => "retryable",
            UploadOutcome::Permanent => "permanent",
        }
    }
}
