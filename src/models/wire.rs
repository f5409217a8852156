//! Request and response bodies for the ingestion endpoints.

use serde::{Deserialize, Serialize};

use super::device::{DeviceDescriptor, SensorAvailability};
use super::sample::Sample;
use super::session::{Address, LatLng, SessionStatus, SessionType};

pub const SESSIONS_START_PATH: &str = "/v1/sessions/start";
pub const SESSIONS_STOP_PATH: &str = "/v1/sessions/stop";
pub const TELEMETRY_PATH: &str = "/v1/telemetry";

/// Body of `POST /v1/sessions/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub delivery_id: String,
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_rider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_location: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_availability: Option<SensorAvailability>,
}

/// Body of `POST /v1/sessions/stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionRequest {
    pub session_id: String,
}

/// Response of both session endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

/// Body of `POST /v1/telemetry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRequest {
    pub session_id: String,
    pub events: Vec<Sample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_omits_unset_optionals() {
        let request = StartSessionRequest {
            delivery_id: "d1".to_string(),
            session_type: SessionType::Drop,
            external_rider_id: None,
            address: None,
            device: None,
            start_location: Some(LatLng {
                lat: 12.9,
                lng: 77.6,
            }),
            sensor_availability: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["deliveryId"], "d1");
        assert_eq!(json["sessionType"], "drop");
        assert_eq!(json["startLocation"]["lat"], 12.9);
        assert!(json.get("externalRiderId").is_none());
        assert!(json.get("device").is_none());
    }

    #[test]
    fn session_response_parses_backend_shape() {
        let response: SessionResponse =
            serde_json::from_str(r#"{"sessionId":"s1","status":"recording"}"#).unwrap();
        assert_eq!(response.session_id, "s1");
        assert_eq!(response.status, SessionStatus::Recording);
    }

    #[test]
    fn telemetry_request_wraps_events_under_session_id() {
        let request = TelemetryRequest {
            session_id: "s1".to_string(),
            events: vec![Sample::new(1.0), Sample::new(2.0)],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["events"].as_array().unwrap().len(), 2);
    }
}
