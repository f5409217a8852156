//! Sample-rate throttling on the sensor monotonic clock.
//!
//! Wall-clock throttling breaks under NTP skew and manual clock changes, so
//! emission gating runs entirely on the sensor's own steady timestamps. The
//! wall offset is captured once per session and added back when a sample's
//! `ts` is produced, which keeps timestamps wall-anchored yet drift-free
//! and strictly increasing within the session.

use chrono::Utc;

use crate::sensors::MonotonicClock;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Minimum-gap gate between emitted samples.
pub struct SampleThrottle {
    min_gap_nanos: i64,
    last_emission_nanos: Option<i64>,
}

impl SampleThrottle {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            min_gap_nanos: NANOS_PER_SECOND / i64::from(sample_rate_hz.max(1)),
            last_emission_nanos: None,
        }
    }

    /// Whether an event at `event_nanos` may produce a sample. The first
    /// event after construction (or reset) always emits.
    pub fn should_emit(&mut self, event_nanos: i64) -> bool {
        match self.last_emission_nanos {
            None => {
                self.last_emission_nanos = Some(event_nanos);
                true
            }
            Some(last) if event_nanos - last >= self.min_gap_nanos => {
                self.last_emission_nanos = Some(event_nanos);
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.last_emission_nanos = None;
    }
}

/// Wall-clock anchor for a session: `wall − monotonic`, captured once at
/// start.
#[derive(Debug, Clone, Copy)]
pub struct ClockAnchor {
    boot_offset_nanos: i64,
}

impl ClockAnchor {
    pub fn capture(clock: &dyn MonotonicClock) -> Self {
        let now = Utc::now();
        let wall_nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        Self {
            boot_offset_nanos: wall_nanos - clock.monotonic_nanos(),
        }
    }

    #[cfg(test)]
    pub fn with_offset(boot_offset_nanos: i64) -> Self {
        Self { boot_offset_nanos }
    }

    /// Seconds since epoch for an event stamped on the sensor clock.
    pub fn wall_seconds(&self, event_nanos: i64) -> f64 {
        (event_nanos + self.boot_offset_nanos) as f64 / NANOS_PER_SECOND as f64
    }
}
