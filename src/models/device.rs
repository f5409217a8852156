//! Device descriptor and sensor availability, captured once per session
//! start and sent so the backend knows which payload fields to expect.

use serde::{Deserialize, Serialize};

/// Static description of the device running the SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub platform: String,
    pub sdk_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            model: None,
            os_version: None,
            app_version: None,
        }
    }
}

/// Which physical sensors the device exposes. Computed once at session
/// start from the adapter set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorAvailability {
    pub has_accelerometer: bool,
    pub has_gyroscope: bool,
    pub has_gravity: bool,
    pub has_rotation_vector: bool,
    pub has_barometer: bool,
    pub has_gps: bool,
    pub has_magnetometer: bool,
}
