//! Per-session background tasks: sensor intake, periodic flush, periodic
//! retry sweep. All three run under the coordinator's cancellation token
//! and observe cancellation at their next suspension point.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::buffer::SampleBuffer;
use crate::models::{BarometerReading, ImuReading, MagnetometerReading, PositionFix, Sample};
use crate::sensors::{ContextSnapshotter, SensorEvent, SensorReading};
use crate::upload::UploadQueue;
use crate::{sdk_error, sdk_info, sdk_warn};

use super::throttle::{ClockAnchor, SampleThrottle};

/// Mutable per-session collection state: the throttle, the clock anchor and
/// the latest value seen per modality.
pub(crate) struct CollectionState {
    throttle: SampleThrottle,
    anchor: ClockAnchor,
    latest_accel: Option<[f64; 3]>,
    latest_gyro: Option<[f64; 3]>,
    latest_gravity: Option<[f64; 3]>,
    latest_attitude: Option<[f64; 4]>,
    latest_barometer: Option<BarometerReading>,
    latest_magnetometer: Option<MagnetometerReading>,
    latest_position: Option<PositionFix>,
    emitted: u64,
    faulted_callbacks: u64,
}

impl CollectionState {
    pub(crate) fn new(sample_rate_hz: u32, anchor: ClockAnchor) -> Self {
        Self {
            throttle: SampleThrottle::new(sample_rate_hz),
            anchor,
            latest_accel: None,
            latest_gyro: None,
            latest_gravity: None,
            latest_attitude: None,
            latest_barometer: None,
            latest_magnetometer: None,
            latest_position: None,
            emitted: 0,
            faulted_callbacks: 0,
        }
    }

    fn assemble(&self, ts: f64, snapshotter: &ContextSnapshotter) -> Sample {
        let imu = ImuReading {
            accel: self.latest_accel,
            gyro: self.latest_gyro,
            gravity: self.latest_gravity,
            attitude: self.latest_attitude,
        };
        Sample {
            ts,
            imu: if imu.is_empty() { None } else { Some(imu) },
            barometer: self.latest_barometer.clone(),
            magnetometer: self.latest_magnetometer.clone(),
            position: self.latest_position.clone(),
            context: Some(snapshotter.snapshot()),
        }
    }
}

/// Receives adapter pushes for the lifetime of the session. Each event
/// refreshes the per-modality cache; qualifying events may emit a sample
/// through the throttle into the buffer.
pub(crate) async fn collection_loop(
    mut events: UnboundedReceiver<SensorEvent>,
    buffer: Arc<SampleBuffer>,
    snapshotter: Arc<ContextSnapshotter>,
    mut state: CollectionState,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        let handled = catch_unwind(AssertUnwindSafe(|| {
                            handle_event(&mut state, &buffer, &snapshotter, event)
                        }));
                        if handled.is_err() {
                            state.faulted_callbacks += 1;
                            sdk_error!(
                                "sensor frame processing panicked ({} so far), frame dropped",
                                state.faulted_callbacks
                            );
                        }
                    }
                    None => break,
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    sdk_info!(
        "collection stopped: {} samples emitted, {} frames faulted",
        state.emitted,
        state.faulted_callbacks
    );
}

fn handle_event(
    state: &mut CollectionState,
    buffer: &SampleBuffer,
    snapshotter: &ContextSnapshotter,
    event: SensorEvent,
) {
    let qualifies = event.reading.qualifies_for_emission();
    match event.reading {
        SensorReading::Accelerometer(v) => state.latest_accel = Some(v),
        SensorReading::Gyroscope(v) => state.latest_gyro = Some(v),
        SensorReading::Gravity(v) => state.latest_gravity = Some(v),
        SensorReading::RotationVector(q) => state.latest_attitude = normalize_quaternion(q),
        SensorReading::Barometer(reading) => state.latest_barometer = Some(reading),
        SensorReading::Magnetometer(reading) => state.latest_magnetometer = Some(reading),
        SensorReading::Position(fix) => state.latest_position = Some(fix),
        SensorReading::Activity(activity) => {
            snapshotter.set_activity(Some(activity));
        }
    }

    if qualifies && state.throttle.should_emit(event.monotonic_nanos) {
        let ts = state.anchor.wall_seconds(event.monotonic_nanos);
        buffer.add(state.assemble(ts, snapshotter));
        state.emitted += 1;
    }
}

/// The attitude invariant: a unit quaternion or nothing.
fn normalize_quaternion(q: [f64; 4]) -> Option<[f64; 4]> {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if norm <= f64::EPSILON || !norm.is_finite() {
        return None;
    }
    Some([q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm])
}

/// Drains the buffer into the queue every `upload_interval_ms`.
pub(crate) async fn flush_loop(
    session_id: String,
    buffer: Arc<SampleBuffer>,
    queue: Arc<UploadQueue>,
    upload_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(upload_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let samples = buffer.drain();
                if samples.is_empty() {
                    continue;
                }
                let count = samples.len();
                if let Err(err) = queue.enqueue(&session_id, samples).await {
                    sdk_error!("flush of {count} sample(s) failed for session {session_id}: {err:?}");
                }
            }
            _ = cancel.cancelled() => {
                sdk_info!("flush loop shutting down");
                break;
            }
        }
    }
}

/// Sweeps the durable store every `retry_interval_ms`. The first tick
/// fires immediately, which is what re-submits batches left over from
/// previous sessions right after start.
pub(crate) async fn retry_loop(
    queue: Arc<UploadQueue>,
    retry_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(retry_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = queue.process_pending().await {
                    sdk_warn!("pending sweep failed: {err:?}");
                }
            }
            _ = cancel.cancelled() => {
                sdk_info!("retry loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::NetworkType;
    use crate::sensors::{BatteryState, PlatformProbe};

    use super::*;

    struct StaticProbe;

    impl PlatformProbe for StaticProbe {
        fn screen_on(&self) -> Option<bool> {
            Some(true)
        }

        fn network_type(&self) -> NetworkType {
            NetworkType::Wifi
        }

        fn battery(&self) -> BatteryState {
            BatteryState::default()
        }
    }

    fn state(rate_hz: u32) -> CollectionState {
        CollectionState::new(rate_hz, ClockAnchor::with_offset(0))
    }

    fn snapshotter() -> ContextSnapshotter {
        ContextSnapshotter::new(Arc::new(StaticProbe))
    }

    fn accel_event(nanos: i64) -> SensorEvent {
        SensorEvent {
            monotonic_nanos: nanos,
            reading: SensorReading::Accelerometer([0.0, 0.0, 9.81]),
        }
    }

    #[test]
    fn qualifying_event_emits_through_throttle() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = state(50);

        handle_event(&mut st, &buffer, &snap, accel_event(0));
        // 5 ms later: inside the 20 ms gap.
        handle_event(&mut st, &buffer, &snap, accel_event(5_000_000));
        handle_event(&mut st, &buffer, &snap, accel_event(20_000_000));

        assert_eq!(buffer.len(), 2);
        assert_eq!(st.emitted, 2);
    }

    #[test]
    fn non_qualifying_events_refresh_caches_without_emitting() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = state(50);

        handle_event(
            &mut st,
            &buffer,
            &snap,
            SensorEvent {
                monotonic_nanos: 0,
                reading: SensorReading::Barometer(BarometerReading {
                    pressure_hpa: 1000.0,
                    relative_altitude_m: None,
                }),
            },
        );
        assert_eq!(buffer.len(), 0);

        // The next qualifying event carries the cached barometer value.
        handle_event(&mut st, &buffer, &snap, accel_event(1));
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(
            drained[0].barometer.as_ref().unwrap().pressure_hpa,
            1000.0
        );
    }

    #[test]
    fn emitted_ts_is_anchored_wall_time() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = CollectionState::new(50, ClockAnchor::with_offset(2_000_000_000));

        handle_event(&mut st, &buffer, &snap, accel_event(500_000_000));
        let drained = buffer.drain();
        assert_eq!(drained[0].ts, 2.5);
    }

    #[test]
    fn activity_reading_lands_in_context() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = state(50);

        handle_event(
            &mut st,
            &buffer,
            &snap,
            SensorEvent {
                monotonic_nanos: 0,
                reading: SensorReading::Activity("in_vehicle".to_string()),
            },
        );
        handle_event(&mut st, &buffer, &snap, accel_event(1));

        let drained = buffer.drain();
        let context = drained[0].context.as_ref().unwrap();
        assert_eq!(context.motion_activity.as_deref(), Some("in_vehicle"));
    }

    #[test]
    fn degenerate_quaternion_is_dropped_not_synthesised() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = state(50);

        handle_event(
            &mut st,
            &buffer,
            &snap,
            SensorEvent {
                monotonic_nanos: 0,
                reading: SensorReading::RotationVector([0.0, 0.0, 0.0, 0.0]),
            },
        );
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].imu.is_none());
    }

    #[test]
    fn rotation_vector_is_normalized_to_unit_length() {
        let buffer = SampleBuffer::new();
        let snap = snapshotter();
        let mut st = state(50);

        handle_event(
            &mut st,
            &buffer,
            &snap,
            SensorEvent {
                monotonic_nanos: 0,
                reading: SensorReading::RotationVector([0.0, 0.0, 2.0, 0.0]),
            },
        );
        let drained = buffer.drain();
        let attitude = drained[0].imu.as_ref().unwrap().attitude.unwrap();
        assert_eq!(attitude, [0.0, 0.0, 1.0, 0.0]);
    }
}
