//! Shared test doubles for the scenario suites: a scripted HTTP transport,
//! push-style sensor adapters, a controllable monotonic clock and a static
//! platform probe.

// Each integration binary compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use desmo_telemetry::error::TransportError;
use desmo_telemetry::http::ApiTransport;
use desmo_telemetry::models::DeviceDescriptor;
use desmo_telemetry::models::NetworkType;
use desmo_telemetry::sensors::{
    BatteryState, MonotonicClock, PlatformProbe, SensorAdapter, SensorKind, SensorReading,
    SensorSink,
};
use desmo_telemetry::{DeliveryTracker, Environment, PlatformHooks, TrackerConfig};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: serde_json::Value,
}

/// Scripted transport: canned results are consumed per path in FIFO order;
/// once a path's script is exhausted it answers with a default success.
pub struct MockTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<u8>, TransportError>>>>,
    session_id: Mutex<String>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            session_id: Mutex::new("s1".to_string()),
        })
    }

    pub fn set_session_id(&self, session_id: &str) {
        *self.session_id.lock().unwrap() = session_id.to_string();
    }

    pub fn script(&self, path: &str, result: Result<Vec<u8>, TransportError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn script_status(&self, path: &str, code: u16) {
        self.script(
            path,
            Err(TransportError::StatusCode {
                code,
                url: format!("http://mock{path}"),
                body_preview: String::new(),
            }),
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Total samples posted to `/v1/telemetry` so far.
    pub fn telemetry_event_count(&self) -> usize {
        self.requests_for("/v1/telemetry")
            .iter()
            .map(|request| {
                request.body["events"]
                    .as_array()
                    .map(|events| events.len())
                    .unwrap_or(0)
            })
            .sum()
    }

    fn default_response(&self, path: &str) -> Vec<u8> {
        let session_id = self.session_id.lock().unwrap().clone();
        match path {
            "/v1/sessions/start" => {
                format!(r#"{{"sessionId":"{session_id}","status":"recording"}}"#).into_bytes()
            }
            "/v1/sessions/stop" => {
                format!(r#"{{"sessionId":"{session_id}","status":"completed"}}"#).into_bytes()
            }
            _ => b"{}".to_vec(),
        }
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn post(&self, path: &str, json_body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let body: serde_json::Value =
            serde_json::from_slice(&json_body).expect("request body is JSON");
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            body,
        });

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(result) => result,
            None => Ok(self.default_response(path)),
        }
    }
}

/// Monotonic clock the test advances by hand.
pub struct FakeClock {
    nanos: AtomicI64,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nanos: AtomicI64::new(0),
        })
    }

    pub fn advance(&self, nanos: i64) {
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl MonotonicClock for FakeClock {
    fn monotonic_nanos(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

/// Push-style adapter the test drives directly.
pub struct PushAdapter {
    kind: SensorKind,
    sink: Mutex<Option<SensorSink>>,
    latest: Mutex<Option<SensorReading>>,
    start_calls: AtomicU64,
    stop_calls: AtomicU64,
}

impl PushAdapter {
    pub fn new(kind: SensorKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            sink: Mutex::new(None),
            latest: Mutex::new(None),
            start_calls: AtomicU64::new(0),
            stop_calls: AtomicU64::new(0),
        })
    }

    pub fn with_latest(self: Arc<Self>, reading: SensorReading) -> Arc<Self> {
        *self.latest.lock().unwrap() = Some(reading);
        self
    }

    pub fn push(&self, monotonic_nanos: i64, reading: SensorReading) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.push(monotonic_nanos, reading);
        }
    }

    pub fn start_count(&self) -> u64 {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u64 {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl SensorAdapter for PushAdapter {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn start(&self, sink: SensorSink) {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = None;
    }

    fn latest(&self) -> Option<SensorReading> {
        self.latest.lock().unwrap().clone()
    }
}

pub struct StaticProbe;

impl PlatformProbe for StaticProbe {
    fn screen_on(&self) -> Option<bool> {
        Some(true)
    }

    fn network_type(&self) -> NetworkType {
        NetworkType::Cellular
    }

    fn battery(&self) -> BatteryState {
        BatteryState {
            level: Some(0.8),
            charging: Some(false),
        }
    }
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig::new("pk_test_0000", Environment::Sandbox)
}

pub fn test_device() -> DeviceDescriptor {
    let mut device = DeviceDescriptor::new("android");
    device.model = Some("Pixel 8".to_string());
    device.os_version = Some("15".to_string());
    device
}

/// Builds a tracker wired to the mock transport, with the given adapters
/// and a fresh SQLite file under `dir`.
pub fn tracker_with(
    dir: &TempDir,
    transport: Arc<MockTransport>,
    clock: Arc<FakeClock>,
    adapters: Vec<Arc<dyn SensorAdapter>>,
) -> DeliveryTracker {
    let hooks = PlatformHooks {
        sensors: adapters,
        probe: Arc::new(StaticProbe),
        device: test_device(),
        storage_path: dir.path().join("pending.sqlite"),
        clock,
    };
    DeliveryTracker::with_transport(test_config(), hooks, transport)
        .expect("tracker construction")
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_for<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
