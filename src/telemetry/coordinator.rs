//! # Telemetry coordinator
//!
//! Owns everything per-session: the sensor adapter set's running state, the
//! event channel, the collection/flush/retry tasks and their cancellation
//! token. A fresh task group is created at `start` and disposed at
//! `flush_and_stop`; nothing is reused across sessions, so a stray loop
//! from a previous session can never write into a new session's buffer.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::buffer::SampleBuffer;
use crate::config::TelemetryOptions;
use crate::sensors::{ContextSnapshotter, MonotonicClock, SensorSet, SensorSink};
use crate::upload::UploadQueue;
use crate::{sdk_info, sdk_warn};

use super::throttle::ClockAnchor;
use super::worker::{collection_loop, flush_loop, retry_loop, CollectionState};

struct ActiveSession {
    session_id: String,
    cancel: CancellationToken,
    sink: SensorSink,
    tasks: Vec<JoinHandle<()>>,
}

pub struct TelemetryCoordinator {
    buffer: Arc<SampleBuffer>,
    queue: Arc<UploadQueue>,
    sensors: Arc<SensorSet>,
    snapshotter: Arc<ContextSnapshotter>,
    clock: Arc<dyn MonotonicClock>,
    options: TelemetryOptions,
    active: Mutex<Option<ActiveSession>>,
}

impl TelemetryCoordinator {
    pub fn new(
        buffer: Arc<SampleBuffer>,
        queue: Arc<UploadQueue>,
        sensors: Arc<SensorSet>,
        snapshotter: Arc<ContextSnapshotter>,
        clock: Arc<dyn MonotonicClock>,
        options: TelemetryOptions,
    ) -> Self {
        Self {
            buffer,
            queue,
            sensors,
            snapshotter,
            clock,
            options,
            active: Mutex::new(None),
        }
    }

    /// Begins collection for an acknowledged session.
    pub async fn start(&self, session_id: String) {
        let mut active = self.active.lock().await;
        if active.is_some() {
            // The controller's state machine should make this unreachable.
            sdk_warn!("coordinator start while a session is active, stopping the old one");
            if let Some(previous) = active.take() {
                Self::teardown(&self.sensors, previous).await;
            }
        }

        // Purge residue left by a process that died while recording.
        self.buffer.clear();
        self.snapshotter.reset();

        let anchor = ClockAnchor::capture(self.clock.as_ref());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sink = SensorSink::new(event_tx);
        self.sensors.start_all(&sink);

        let cancel = CancellationToken::new();
        let state = CollectionState::new(self.options.sample_rate_hz, anchor);

        let tasks = vec![
            tokio::spawn(collection_loop(
                event_rx,
                Arc::clone(&self.buffer),
                Arc::clone(&self.snapshotter),
                state,
                cancel.clone(),
            )),
            tokio::spawn(flush_loop(
                session_id.clone(),
                Arc::clone(&self.buffer),
                Arc::clone(&self.queue),
                Duration::from_millis(self.options.upload_interval_ms),
                cancel.clone(),
            )),
            tokio::spawn(retry_loop(
                Arc::clone(&self.queue),
                Duration::from_millis(self.options.retry_interval_ms),
                cancel.clone(),
            )),
        ];

        sdk_info!("telemetry collection started for session {session_id}");
        *active = Some(ActiveSession {
            session_id,
            cancel,
            sink,
            tasks,
        });
    }

    /// Halts collection and performs the final buffer drain. Idempotent: a
    /// second call (a retried stop after a remote failure) is a no-op.
    pub async fn flush_and_stop(&self) {
        let Some(session) = self.active.lock().await.take() else {
            return;
        };

        let session_id = session.session_id.clone();
        let rejected = session.sink.rejected_count();
        Self::teardown(&self.sensors, session).await;

        // Final delivery attempt; the queue persists before uploading, so
        // anything that fails here is picked up by a later sweep.
        let samples = self.buffer.drain();
        if !samples.is_empty() {
            let count = samples.len();
            if let Err(err) = self.queue.enqueue(&session_id, samples).await {
                sdk_warn!("final flush of {count} sample(s) deferred to retry: {err:?}");
            }
        }

        let dropped = self.buffer.dropped_count();
        sdk_info!(
            "telemetry collection stopped for session {session_id} \
             ({dropped} overflow-dropped, {rejected} rejected pushes)"
        );
    }

    /// Immediate drain-and-enqueue, outside the flush cadence.
    pub async fn flush_now(&self) {
        let session_id = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(session) => session.session_id.clone(),
                None => return,
            }
        };
        let samples = self.buffer.drain();
        if samples.is_empty() {
            return;
        }
        let count = samples.len();
        if let Err(err) = self.queue.enqueue(&session_id, samples).await {
            sdk_warn!("on-demand flush of {count} sample(s) failed: {err:?}");
        }
    }

    /// The platform may have throttled sensors while backgrounded; re-arm
    /// every adapter on the existing session sink.
    pub async fn on_foreground(&self) {
        self.snapshotter.set_foreground(true);
        let active = self.active.lock().await;
        if let Some(session) = active.as_ref() {
            self.sensors.start_all(&session.sink);
            sdk_info!("foregrounded, sensors re-armed");
        }
    }

    /// Collection continues while backgrounded; only the context bit moves.
    pub async fn on_background(&self) {
        self.snapshotter.set_foreground(false);
        sdk_info!("backgrounded, collection continues");
    }

    pub async fn is_collecting(&self) -> bool {
        self.active.lock().await.is_some()
    }

    async fn teardown(sensors: &SensorSet, session: ActiveSession) {
        sensors.stop_all();
        session.cancel.cancel();
        for task in session.tasks {
            if let Err(err) = task.await {
                sdk_warn!("coordinator task failed to join: {err:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::db::BatchStore;
    use crate::error::TransportError;
    use crate::http::{ApiTransport, TelemetryApi};
    use crate::models::{NetworkType, Sample};
    use crate::sensors::{BatteryState, PlatformProbe, SystemMonotonicClock};

    use super::*;

    struct AlwaysOk;

    #[async_trait]
    impl ApiTransport for AlwaysOk {
        async fn post(&self, _path: &str, _body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            Ok(b"{}".to_vec())
        }
    }

    struct StaticProbe;

    impl PlatformProbe for StaticProbe {
        fn screen_on(&self) -> Option<bool> {
            None
        }

        fn network_type(&self) -> NetworkType {
            NetworkType::Unknown
        }

        fn battery(&self) -> BatteryState {
            BatteryState::default()
        }
    }

    fn coordinator(dir: &TempDir, buffer: Arc<SampleBuffer>) -> TelemetryCoordinator {
        let store = BatchStore::open(dir.path().join("pending.sqlite")).unwrap();
        let queue = Arc::new(UploadQueue::new(store, TelemetryApi::new(Arc::new(AlwaysOk))));
        TelemetryCoordinator::new(
            buffer,
            queue,
            Arc::new(SensorSet::new(Vec::new())),
            Arc::new(ContextSnapshotter::new(Arc::new(StaticProbe))),
            Arc::new(SystemMonotonicClock),
            TelemetryOptions::default(),
        )
    }

    #[tokio::test]
    async fn start_purges_crash_residue_from_the_buffer() {
        let dir = TempDir::new().unwrap();
        let buffer = Arc::new(SampleBuffer::new());
        let coordinator = coordinator(&dir, Arc::clone(&buffer));

        // Residue from a process that died while recording.
        buffer.add(Sample::new(1.0));
        buffer.add(Sample::new(2.0));

        coordinator.start("s-new".to_string()).await;
        assert!(coordinator.is_collecting().await);

        // No sensor push has happened: the first drain must be empty.
        assert!(buffer.drain().is_empty());

        coordinator.flush_and_stop().await;
        assert!(!coordinator.is_collecting().await);
    }

    #[tokio::test]
    async fn flush_and_stop_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let buffer = Arc::new(SampleBuffer::new());
        let coordinator = coordinator(&dir, buffer);

        coordinator.start("s1".to_string()).await;
        coordinator.flush_and_stop().await;
        // A retried stop after a remote failure calls this again.
        coordinator.flush_and_stop().await;
        assert!(!coordinator.is_collecting().await);
    }
}
