//! # Session controller
//!
//! Serialises start/stop/flush under one async mutex, held across the
//! remote call so overlapping transitions are impossible. Every public
//! method is total: it returns a typed result and leaves the state machine
//! consistent even when the calling future is dropped mid-await.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{TrackerError, TrackerResult};
use crate::http::TelemetryApi;
use crate::models::wire::{StartSessionRequest, StopSessionRequest};
use crate::models::{Address, DeviceDescriptor, LatLng, Session, SessionType};
use crate::sensors::SensorSet;
use crate::telemetry::TelemetryCoordinator;
use crate::{sdk_info, sdk_warn};

use super::state::{SessionPhase, SessionSlot};

/// Host-supplied arguments for `start_session`.
#[derive(Debug, Clone)]
pub struct StartSessionArgs {
    pub delivery_id: String,
    pub session_type: SessionType,
    pub external_rider_id: Option<String>,
    pub address: Option<Address>,
    pub start_location: Option<LatLng>,
}

impl StartSessionArgs {
    pub fn new(delivery_id: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            session_type,
            external_rider_id: None,
            address: None,
            start_location: None,
        }
    }
}

pub struct SessionController {
    slot: Mutex<SessionSlot>,
    api: TelemetryApi,
    coordinator: Arc<TelemetryCoordinator>,
    sensors: Arc<SensorSet>,
    device: DeviceDescriptor,
}

/// Restores the slot to a known phase if the owning future is dropped
/// before the transition completes (caller cancellation during a remote
/// call). Disarmed on every deliberate exit path.
struct PhaseRollback<'a> {
    slot: &'a mut SessionSlot,
    rollback_to: SessionPhase,
    armed: bool,
}

impl<'a> PhaseRollback<'a> {
    fn arm(slot: &'a mut SessionSlot, rollback_to: SessionPhase) -> Self {
        Self {
            slot,
            rollback_to,
            armed: true,
        }
    }

    fn disarm(&mut self) -> &mut SessionSlot {
        self.armed = false;
        self.slot
    }
}

impl Drop for PhaseRollback<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slot.phase = self.rollback_to;
        }
    }
}

impl SessionController {
    pub fn new(
        api: TelemetryApi,
        coordinator: Arc<TelemetryCoordinator>,
        sensors: Arc<SensorSet>,
        device: DeviceDescriptor,
    ) -> Self {
        Self {
            slot: Mutex::new(SessionSlot::new()),
            api,
            coordinator,
            sensors,
            device,
        }
    }

    /// Starts a session: `idle → starting → recording`, or back to `idle`
    /// when the remote start fails.
    pub async fn start_session(&self, args: StartSessionArgs) -> TrackerResult<Session> {
        let mut slot = self.slot.lock().await;
        if slot.phase != SessionPhase::Idle {
            return Err(TrackerError::InvalidState {
                expected: "idle",
                actual: slot.phase.as_str(),
            });
        }
        slot.phase = SessionPhase::Starting;
        let mut rollback = PhaseRollback::arm(&mut *slot, SessionPhase::Idle);

        let start_location = args.start_location.or_else(|| {
            self.sensors.last_known_position().map(|fix| LatLng {
                lat: fix.lat,
                lng: fix.lng,
            })
        });
        let request = StartSessionRequest {
            delivery_id: args.delivery_id,
            session_type: args.session_type,
            external_rider_id: args.external_rider_id,
            address: args.address,
            device: Some(self.device.clone()),
            start_location,
            sensor_availability: Some(self.sensors.availability()),
        };

        match self.api.start_session(&request).await {
            Ok(response) => {
                self.coordinator.start(response.session_id.clone()).await;
                let slot = rollback.disarm();
                slot.begin_recording(response.session_id.clone());
                sdk_info!("session {} recording", response.session_id);
                Ok(Session {
                    session_id: response.session_id,
                    status: response.status,
                })
            }
            Err(err) => {
                let slot = rollback.disarm();
                slot.phase = SessionPhase::Idle;
                sdk_warn!("session start failed: {err}");
                Err(TrackerError::Transport(err))
            }
        }
    }

    /// Stops the active session: `recording → stopping → idle`. A remote
    /// failure returns the machine to `recording` so the caller can retry;
    /// collection is already halted and the final batch persisted, so the
    /// retry only re-issues the remote stop.
    pub async fn stop_session(&self) -> TrackerResult<Session> {
        let mut slot = self.slot.lock().await;
        if slot.phase != SessionPhase::Recording {
            return Err(TrackerError::InvalidState {
                expected: "recording",
                actual: slot.phase.as_str(),
            });
        }
        let Some(session_id) = slot.session_id.clone() else {
            return Err(TrackerError::NoActiveSession);
        };
        slot.phase = SessionPhase::Stopping;
        let mut rollback = PhaseRollback::arm(&mut *slot, SessionPhase::Recording);

        self.coordinator.flush_and_stop().await;

        let request = StopSessionRequest {
            session_id: session_id.clone(),
        };
        match self.api.stop_session(&request).await {
            Ok(response) => {
                let slot = rollback.disarm();
                slot.finish();
                sdk_info!("session {session_id} stopped");
                Ok(Session {
                    session_id: response.session_id,
                    status: response.status,
                })
            }
            Err(err) => {
                let slot = rollback.disarm();
                slot.phase = SessionPhase::Recording;
                sdk_warn!("session stop failed, still stoppable: {err}");
                Err(TrackerError::Transport(err))
            }
        }
    }

    /// On-demand drain of the buffer into the upload queue.
    pub async fn flush(&self) -> TrackerResult<()> {
        let slot = self.slot.lock().await;
        if slot.phase != SessionPhase::Recording || slot.session_id.is_none() {
            return Err(TrackerError::NoActiveSession);
        }
        self.coordinator.flush_now().await;
        Ok(())
    }

    pub async fn on_foreground(&self) {
        let slot = self.slot.lock().await;
        if slot.phase == SessionPhase::Idle {
            return;
        }
        self.coordinator.on_foreground().await;
    }

    pub async fn on_background(&self) {
        let slot = self.slot.lock().await;
        if slot.phase == SessionPhase::Idle {
            return;
        }
        self.coordinator.on_background().await;
    }

    pub async fn current_phase(&self) -> SessionPhase {
        self.slot.lock().await.phase
    }

    pub async fn active_session_id(&self) -> Option<String> {
        self.slot.lock().await.session_id.clone()
    }
}
