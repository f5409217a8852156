//! Sensor adapter contract and the per-session adapter set.
//!
//! Platform adapters (IMU, barometer, magnetometer, location, activity) live
//! outside this crate. Each one implements [`SensorAdapter`]: the
//! coordinator hands it a [`SensorSink`] at start and the adapter pushes
//! monotonic-stamped readings from its own callback thread. The sink is the
//! panic boundary: a throwing callback is counted and dropped, never
//! propagated into the host.

pub mod clock;
pub mod context;
pub mod readings;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::{PositionFix, SensorAvailability};
use crate::sdk_warn;

pub use clock::{MonotonicClock, SystemMonotonicClock};
pub use context::{BatteryState, ContextSnapshotter, PlatformProbe};
pub use readings::SensorReading;

/// Physical source identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Gravity,
    RotationVector,
    Barometer,
    Magnetometer,
    Location,
    Activity,
}

/// One adapter push: the reading plus its timestamp on the sensor's own
/// steady clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub monotonic_nanos: i64,
    pub reading: SensorReading,
}

/// Uniform contract for every physical source.
///
/// `start` may be called again on an already-running adapter (the
/// foreground hook does this after the platform throttles backgrounded
/// sensors); implementations treat it as a re-arm, not an error.
pub trait SensorAdapter: Send + Sync {
    fn kind(&self) -> SensorKind;

    fn is_available(&self) -> bool;

    fn start(&self, sink: SensorSink);

    fn stop(&self);

    /// Latest reading for pull-style modalities (location keeps its last
    /// known fix here). Push-style adapters return `None`.
    fn latest(&self) -> Option<SensorReading> {
        None
    }
}

/// Where adapters push readings. Cloneable; each clone feeds the same
/// session channel. Pushing after the session ended is a silent no-op.
#[derive(Clone)]
pub struct SensorSink {
    tx: mpsc::UnboundedSender<SensorEvent>,
    rejected: Arc<AtomicU64>,
}

impl SensorSink {
    pub fn new(tx: mpsc::UnboundedSender<SensorEvent>) -> Self {
        Self {
            tx,
            rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Accepts one reading from a platform callback thread. Returns
    /// immediately; never blocks, never unwinds into the caller.
    pub fn push(&self, monotonic_nanos: i64, reading: SensorReading) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.tx.send(SensorEvent {
                monotonic_nanos,
                reading,
            })
        }));
        match outcome {
            Ok(Ok(())) => {}
            // Receiver gone: the session stopped while the platform thread
            // was mid-callback.
            Ok(Err(_)) | Err(_) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Pushes rejected because the session channel was closed or the
    /// callback panicked.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// The adapter set for one device. Owned by the coordinator for the
/// duration of a session.
pub struct SensorSet {
    adapters: Vec<Arc<dyn SensorAdapter>>,
}

impl SensorSet {
    pub fn new(adapters: Vec<Arc<dyn SensorAdapter>>) -> Self {
        Self { adapters }
    }

    /// Availability bitset sent with the session start request.
    pub fn availability(&self) -> SensorAvailability {
        let mut availability = SensorAvailability::default();
        for adapter in &self.adapters {
            if !adapter.is_available() {
                continue;
            }
            match adapter.kind() {
                SensorKind::Accelerometer => availability.has_accelerometer = true,
                SensorKind::Gyroscope => availability.has_gyroscope = true,
                SensorKind::Gravity => availability.has_gravity = true,
                SensorKind::RotationVector => availability.has_rotation_vector = true,
                SensorKind::Barometer => availability.has_barometer = true,
                SensorKind::Magnetometer => availability.has_magnetometer = true,
                SensorKind::Location => availability.has_gps = true,
                SensorKind::Activity => {}
            }
        }
        availability
    }

    /// Starts every available adapter. Unavailable ones are skipped and the
    /// session proceeds without them.
    pub fn start_all(&self, sink: &SensorSink) {
        for adapter in &self.adapters {
            if adapter.is_available() {
                adapter.start(sink.clone());
            } else {
                sdk_warn!("sensor {:?} unavailable, skipping", adapter.kind());
            }
        }
    }

    pub fn stop_all(&self) {
        for adapter in &self.adapters {
            adapter.stop();
        }
    }

    /// Last known position across location adapters, without waiting for a
    /// fresh fix.
    pub fn last_known_position(&self) -> Option<PositionFix> {
        self.adapters
            .iter()
            .filter(|adapter| adapter.kind() == SensorKind::Location)
            .find_map(|adapter| match adapter.latest() {
                Some(SensorReading::Position(fix)) => Some(fix),
                _ => None,
            })
    }
}
