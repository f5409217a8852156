pub mod device;
pub mod sample;
pub mod session;
pub mod wire;

pub use device::{DeviceDescriptor, SensorAvailability};
pub use sample::{
    BarometerReading, DeviceContext, ImuReading, MagnetometerReading, NetworkType, PositionFix,
    Sample,
};
pub use session::{Address, LatLng, Session, SessionStatus, SessionType};
