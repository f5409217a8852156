//! # HTTP façade
//!
//! Minimal POST contract against the ingestion backend: JSON bodies,
//! gzip-compressed on the wire, authenticated with the `Desmo-Key` header.
//! The transport is a trait so the queue and controller can run against a
//! scripted double in tests.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::TrackerConfig;
use crate::error::TransportError;
use crate::models::wire::{
    SessionResponse, StartSessionRequest, StopSessionRequest, TelemetryRequest,
    SESSIONS_START_PATH, SESSIONS_STOP_PATH, TELEMETRY_PATH,
};

const API_KEY_HEADER: &str = "Desmo-Key";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_PREVIEW_LIMIT: usize = 256;

/// Blocking-shaped request-response seam: one JSON POST in, raw body bytes
/// out or a typed transport failure.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn post(&self, path: &str, json_body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// Production transport over `reqwest`.
pub struct ApiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &TrackerConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| TransportError::Network {
                cause: err.to_string(),
            })?;

        Ok(Self {
            base_url: config.environment.base_url().to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl ApiTransport for ApiClient {
    async fn post(&self, path: &str, json_body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let compressed = gzip(&json_body).map_err(|err| TransportError::Network {
            cause: format!("gzip encoding failed: {err}"),
        })?;

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Content-Encoding", "gzip")
            .body(compressed)
            .send()
            .await
            .map_err(|err| TransportError::Network {
                cause: err.to_string(),
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|_| TransportError::Decoding)?;

        if !status.is_success() {
            return Err(TransportError::StatusCode {
                code: status.as_u16(),
                url,
                body_preview: body_preview(&bytes),
            });
        }

        Ok(bytes.to_vec())
    }
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

fn body_preview(bytes: &[u8]) -> String {
    let end = bytes.len().min(BODY_PREVIEW_LIMIT);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Typed endpoint wrappers shared by the controller and the upload queue.
#[derive(Clone)]
pub struct TelemetryApi {
    transport: Arc<dyn ApiTransport>,
}

impl TelemetryApi {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Arc<dyn ApiTransport> {
        Arc::clone(&self.transport)
    }

    pub async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<SessionResponse, TransportError> {
        self.post_json(SESSIONS_START_PATH, request).await
    }

    pub async fn stop_session(
        &self,
        request: &StopSessionRequest,
    ) -> Result<SessionResponse, TransportError> {
        self.post_json(SESSIONS_STOP_PATH, request).await
    }

    pub async fn upload_telemetry(
        &self,
        request: &TelemetryRequest,
    ) -> Result<(), TransportError> {
        let body = encode(request)?;
        self.transport.post(TELEMETRY_PATH, body).await?;
        Ok(())
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = encode(request)?;
        let response = self.transport.post(path, body).await?;
        serde_json::from_slice(&response).map_err(|_| TransportError::Decoding)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(value).map_err(|_| TransportError::Decoding)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn gzip_round_trips() {
        let payload = br#"{"sessionId":"s1","events":[]}"#;
        let compressed = gzip(payload).unwrap();
        assert_ne!(compressed.as_slice(), payload.as_slice());

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed.as_slice(), payload.as_slice());
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let body = vec![b'x'; 1_000];
        let preview = body_preview(&body);
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT);
    }

    #[test]
    fn body_preview_keeps_short_bodies_whole() {
        assert_eq!(body_preview(b"rate limited"), "rate limited");
    }
}
