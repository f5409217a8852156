//! Monotonic clock seam.
//!
//! Sensor timestamps arrive on the platform's steady clock (nanoseconds
//! since boot). The coordinator needs the same clock to anchor wall time at
//! session start, so the source is a trait and tests can drive it.

use std::sync::OnceLock;
use std::time::Instant;

pub trait MonotonicClock: Send + Sync {
    /// Nanoseconds on the steady clock. Never decreases.
    fn monotonic_nanos(&self) -> i64;
}

/// Default clock: nanoseconds since the first observation in this process.
/// The origin is arbitrary; only differences and the captured wall offset
/// matter.
pub struct SystemMonotonicClock;

static ORIGIN: OnceLock<Instant> = OnceLock::new();

impl MonotonicClock for SystemMonotonicClock {
    fn monotonic_nanos(&self) -> i64 {
        let origin = ORIGIN.get_or_init(Instant::now);
        origin.elapsed().as_nanos() as i64
    }
}
