pub mod coordinator;
pub mod throttle;
mod worker;

pub use coordinator::TelemetryCoordinator;
pub use throttle::{ClockAnchor, SampleThrottle};
