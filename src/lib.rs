//! # Desmo telemetry SDK core
//!
//! Embedded delivery-tracking telemetry: records a bounded session during a
//! delivery, samples device sensors and location at a fixed cadence,
//! batches the samples and ships them to the ingestion backend with
//! at-least-once semantics across process death, network outages and rapid
//! lifecycle churn.
//!
//! The host constructs one [`DeliveryTracker`] from a [`TrackerConfig`] and
//! its platform integrations (sensor adapters, platform probe, lifecycle
//! source), then drives it:
//!
//! ```ignore
//! let tracker = DeliveryTracker::new(config, platform)?;
//! let session = tracker
//!     .start_session(StartSessionArgs::new("delivery-42", SessionType::Drop))
//!     .await?;
//! // ... rider completes the leg ...
//! tracker.stop_session().await?;
//! ```
//!
//! Batches that fail to upload are persisted and re-submitted under their
//! original session id on later sweeps, including sweeps that run while a
//! different session is active.

pub mod buffer;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod sensors;
pub mod session;
pub mod telemetry;
pub mod upload;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use buffer::SampleBuffer;
use db::BatchStore;
use http::{ApiClient, ApiTransport, TelemetryApi};
use sensors::{ContextSnapshotter, MonotonicClock, PlatformProbe, SensorAdapter, SensorSet};
use telemetry::TelemetryCoordinator;
use upload::UploadQueue;

pub use config::{Environment, TelemetryOptions, TrackerConfig};
pub use error::{TrackerError, TrackerResult, TransportError};
pub use lifecycle::{LifecycleListener, LifecycleSource};
pub use models::{Sample, Session, SessionStatus, SessionType};
pub use session::{SessionPhase, StartSessionArgs};
pub use upload::UploadOutcome;

/// Host-provided platform integrations.
pub struct PlatformHooks {
    /// Adapters for every physical source the device exposes.
    pub sensors: Vec<Arc<dyn SensorAdapter>>,
    /// Probe for screen, network and battery state.
    pub probe: Arc<dyn PlatformProbe>,
    /// Static device description sent with each session start.
    pub device: models::DeviceDescriptor,
    /// Path of the SQLite file backing the pending-batch store.
    pub storage_path: PathBuf,
    /// Steady clock shared with the sensor subsystem.
    pub clock: Arc<dyn MonotonicClock>,
}

/// The process-wide SDK handle. Construct once, share by reference.
///
/// Dropping the last handle shuts the store's worker thread down; any
/// still-pending batches stay on disk for the next process.
pub struct DeliveryTracker {
    controller: Arc<session::SessionController>,
    store: BatchStore,
}

impl DeliveryTracker {
    /// Builds the full pipeline against the production HTTP transport.
    pub fn new(config: TrackerConfig, platform: PlatformHooks) -> TrackerResult<Self> {
        let config = config.validated()?;
        let transport: Arc<dyn ApiTransport> = Arc::new(ApiClient::new(&config)?);
        Self::with_transport(config, platform, transport)
    }

    /// Same wiring with a caller-supplied transport. This is the seam test
    /// harnesses and proxying hosts use.
    pub fn with_transport(
        config: TrackerConfig,
        platform: PlatformHooks,
        transport: Arc<dyn ApiTransport>,
    ) -> TrackerResult<Self> {
        let config = config.validated()?;
        utils::logging::set_logging_enabled(config.logging_enabled);

        let store = BatchStore::open(platform.storage_path).map_err(TrackerError::storage)?;
        let api = TelemetryApi::new(transport);
        let queue = Arc::new(UploadQueue::new(store.clone(), api.clone()));
        let buffer = Arc::new(SampleBuffer::new());
        let snapshotter = Arc::new(ContextSnapshotter::new(platform.probe));
        let sensors = Arc::new(SensorSet::new(platform.sensors));

        let coordinator = Arc::new(TelemetryCoordinator::new(
            buffer,
            Arc::clone(&queue),
            Arc::clone(&sensors),
            snapshotter,
            platform.clock,
            config.telemetry.clone(),
        ));
        let controller = Arc::new(session::SessionController::new(
            api,
            coordinator,
            sensors,
            platform.device,
        ));

        Ok(Self { controller, store })
    }

    /// Starts a recording session. Fails with `InvalidState` unless idle.
    pub async fn start_session(&self, args: StartSessionArgs) -> TrackerResult<Session> {
        self.controller.start_session(args).await
    }

    /// Stops the active session. On a remote failure the session stays
    /// stoppable: state returns to `recording` and the call can be retried.
    pub async fn stop_session(&self) -> TrackerResult<Session> {
        self.controller.stop_session().await
    }

    /// Drains buffered samples into the upload queue immediately.
    pub async fn flush(&self) -> TrackerResult<()> {
        self.controller.flush().await
    }

    pub async fn on_foreground(&self) {
        self.controller.on_foreground().await;
    }

    pub async fn on_background(&self) {
        self.controller.on_background().await;
    }

    /// Batches persisted but not yet acknowledged by the backend.
    pub async fn pending_batch_count(&self) -> TrackerResult<usize> {
        self.store
            .pending_batch_count()
            .await
            .map_err(TrackerError::storage)
    }

    /// Installs this tracker as the source's lifecycle listener, replacing
    /// any prior binding. Call from within the host's tokio runtime.
    pub fn bind_lifecycle(&self, source: &dyn LifecycleSource) {
        lifecycle::bind(source, Arc::clone(&self.controller));
    }

    /// Removes the lifecycle binding installed by [`Self::bind_lifecycle`].
    pub fn unbind_lifecycle(&self, source: &dyn LifecycleSource) {
        lifecycle::unbind(source);
    }

    pub async fn current_phase(&self) -> SessionPhase {
        self.controller.current_phase().await
    }
}
