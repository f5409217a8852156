//! Session data model.
//!
//! A session is a remotely-identified recording interval bracketed by the
//! `sessions/start` and `sessions/stop` endpoints. The controller holds at
//! most one active session id at a time.

use serde::{Deserialize, Serialize};

/// Remote session identity as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Recording,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Recording => "recording",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

/// Delivery leg the session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Pickup,
    Drop,
    Transit,
}

/// Delivery address attached to a session start, when the host knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

/// A bare coordinate pair, used for the session start location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Recording).unwrap(),
            r#""recording""#
        );
        assert_eq!(SessionStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn session_type_serialises_as_camel_case() {
        assert_eq!(
            serde_json::to_string(&SessionType::Pickup).unwrap(),
            r#""pickup""#
        );
        assert_eq!(
            serde_json::to_string(&SessionType::Transit).unwrap(),
            r#""transit""#
        );
    }
}
