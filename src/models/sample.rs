//! Telemetry sample data model.
//!
//! Represents a single on-device record assembled by the coordinator. Every
//! sample carries a timestamp; every nested payload is present only when the
//! device actually produced a reading for it. Nothing is ever synthesised.

use serde::{Deserialize, Serialize};

/// A single telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Seconds since epoch, derived from the sensor monotonic clock plus the
    /// wall-clock offset captured at session start. Strictly increasing
    /// within a session.
    pub ts: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub imu: Option<ImuReading>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub barometer: Option<BarometerReading>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnetometer: Option<MagnetometerReading>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionFix>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DeviceContext>,
}

impl Sample {
    pub fn new(ts: f64) -> Self {
        Self {
            ts,
            imu: None,
            barometer: None,
            magnetometer: None,
            position: None,
            context: None,
        }
    }
}

/// Inertial measurement grouping: accelerometer, gyroscope, gravity and the
/// orientation quaternion derived from the rotation-vector sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImuReading {
    /// Accelerometer [x, y, z] in m/s².
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel: Option<[f64; 3]>,

    /// Gyroscope [x, y, z] in rad/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro: Option<[f64; 3]>,

    /// Gravity vector [x, y, z] in m/s².
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<[f64; 3]>,

    /// Unit quaternion [x, y, z, w] from the rotation-vector sensor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attitude: Option<[f64; 4]>,
}

impl ImuReading {
    pub fn is_empty(&self) -> bool {
        self.accel.is_none()
            && self.gyro.is_none()
            && self.gravity.is_none()
            && self.attitude.is_none()
    }
}

/// Barometric pressure reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarometerReading {
    pub pressure_hpa: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_altitude_m: Option<f64>,
}

/// Magnetic field reading in µT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetometerReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A geographic position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing_deg: Option<f64>,
    /// Provider of the fix, e.g. "gps" or "fused".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Slow-moving device context attached to each sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_foreground: Option<bool>,
    /// Battery charge in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging: Option<bool>,
    pub network: NetworkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_activity: Option<String>,
}

/// Network connectivity class at sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Wifi,
    Cellular,
    None,
    Unknown,
}
