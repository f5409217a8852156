//! Typed readings pushed by sensor adapters.

use crate::models::{BarometerReading, MagnetometerReading, PositionFix};

use super::SensorKind;

/// One reading from one physical source.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    /// [x, y, z] in m/s².
    Accelerometer([f64; 3]),
    /// [x, y, z] in rad/s.
    Gyroscope([f64; 3]),
    /// Gravity vector [x, y, z] in m/s².
    Gravity([f64; 3]),
    /// Unit quaternion [x, y, z, w].
    RotationVector([f64; 4]),
    Barometer(BarometerReading),
    Magnetometer(MagnetometerReading),
    Position(PositionFix),
    /// Detected motion activity, e.g. "on_bicycle".
    Activity(String),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Accelerometer(_) => SensorKind::Accelerometer,
            SensorReading::Gyroscope(_) => SensorKind::Gyroscope,
            SensorReading::Gravity(_) => SensorKind::Gravity,
            SensorReading::RotationVector(_) => SensorKind::RotationVector,
            SensorReading::Barometer(_) => SensorKind::Barometer,
            SensorReading::Magnetometer(_) => SensorKind::Magnetometer,
            SensorReading::Position(_) => SensorKind::Location,
            SensorReading::Activity(_) => SensorKind::Activity,
        }
    }

    /// Whether this modality may trigger sample emission. Only the IMU
    /// family drives the cadence; everything else just refreshes caches.
    pub fn qualifies_for_emission(&self) -> bool {
        matches!(
            self,
            SensorReading::Accelerometer(_)
                | SensorReading::Gyroscope(_)
                | SensorReading::Gravity(_)
                | SensorReading::RotationVector(_)
        )
    }
}
