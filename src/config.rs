//! # Configuration
//!
//! SDK configuration supplied by the host at construction. The API key is
//! the only hard constructor constraint; telemetry options outside their
//! documented bounds are clamped with a warning rather than rejected.

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::sdk_warn;

const API_KEY_PREFIX: &str = "pk_";

pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 50;
pub const MAX_SAMPLE_RATE_HZ: u32 = 100;
pub const DEFAULT_LOCATION_UPDATE_MS: u64 = 2_000;
pub const MIN_LOCATION_UPDATE_MS: u64 = 500;
pub const DEFAULT_UPLOAD_INTERVAL_MS: u64 = 5_000;
pub const MIN_UPLOAD_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 30_000;
pub const MIN_RETRY_INTERVAL_MS: u64 = 5_000;

/// Backend environment the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Environment {
    Sandbox,
    Live,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://api.sandbox.desmo.dev",
            Environment::Live => "https://api.desmo.dev",
        }
    }
}

/// Telemetry pipeline tuning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryOptions {
    /// Target sensor sample rate, 1..=100 Hz.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Requested location update cadence, >= 500 ms.
    #[serde(default = "default_location_update_ms")]
    pub location_update_ms: u64,

    /// Buffer flush cadence, >= 1000 ms.
    #[serde(default = "default_upload_interval_ms")]
    pub upload_interval_ms: u64,

    /// Pending-batch sweep cadence, >= 5000 ms.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_sample_rate_hz() -> u32 {
    DEFAULT_SAMPLE_RATE_HZ
}

fn default_location_update_ms() -> u64 {
    DEFAULT_LOCATION_UPDATE_MS
}

fn default_upload_interval_ms() -> u64 {
    DEFAULT_UPLOAD_INTERVAL_MS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            location_update_ms: DEFAULT_LOCATION_UPDATE_MS,
            upload_interval_ms: DEFAULT_UPLOAD_INTERVAL_MS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

impl TelemetryOptions {
    /// Clamps every option into its documented range, warning on each
    /// adjustment. Out-of-range values come from host misconfiguration and
    /// must not disable the pipeline.
    pub fn clamped(mut self) -> Self {
        if self.sample_rate_hz == 0 || self.sample_rate_hz > MAX_SAMPLE_RATE_HZ {
            let clamped = self.sample_rate_hz.clamp(1, MAX_SAMPLE_RATE_HZ);
            sdk_warn!(
                "sample_rate_hz {} out of range, clamping to {}",
                self.sample_rate_hz,
                clamped
            );
            self.sample_rate_hz = clamped;
        }
        if self.location_update_ms < MIN_LOCATION_UPDATE_MS {
            sdk_warn!(
                "location_update_ms {} below minimum, clamping to {}",
                self.location_update_ms,
                MIN_LOCATION_UPDATE_MS
            );
            self.location_update_ms = MIN_LOCATION_UPDATE_MS;
        }
        if self.upload_interval_ms < MIN_UPLOAD_INTERVAL_MS {
            sdk_warn!(
                "upload_interval_ms {} below minimum, clamping to {}",
                self.upload_interval_ms,
                MIN_UPLOAD_INTERVAL_MS
            );
            self.upload_interval_ms = MIN_UPLOAD_INTERVAL_MS;
        }
        if self.retry_interval_ms < MIN_RETRY_INTERVAL_MS {
            sdk_warn!(
                "retry_interval_ms {} below minimum, clamping to {}",
                self.retry_interval_ms,
                MIN_RETRY_INTERVAL_MS
            );
            self.retry_interval_ms = MIN_RETRY_INTERVAL_MS;
        }
        self
    }
}

/// Top-level SDK configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    pub api_key: String,
    pub environment: Environment,
    #[serde(default)]
    pub logging_enabled: bool,
    #[serde(default)]
    pub telemetry: TelemetryOptions,
}

impl TrackerConfig {
    pub fn new(api_key: impl Into<String>, environment: Environment) -> Self {
        Self {
            api_key: api_key.into(),
            environment,
            logging_enabled: false,
            telemetry: TelemetryOptions::default(),
        }
    }

    /// Validates the key prefix and clamps telemetry options.
    pub fn validated(mut self) -> TrackerResult<Self> {
        if !self.api_key.starts_with(API_KEY_PREFIX) {
            return Err(TrackerError::InvalidApiKey);
        }
        self.telemetry = self.telemetry.clamped();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_key_without_prefix() {
        let config = TrackerConfig::new("sk_live_abc", Environment::Sandbox);
        assert!(matches!(
            config.validated(),
            Err(TrackerError::InvalidApiKey)
        ));
    }

    #[test]
    fn accepts_pk_prefixed_key() {
        let config = TrackerConfig::new("pk_test_abc", Environment::Live);
        let validated = config.validated().unwrap();
        assert_eq!(validated.environment.base_url(), "https://api.desmo.dev");
    }

    #[test]
    fn clamps_out_of_range_options() {
        let options = TelemetryOptions {
            sample_rate_hz: 500,
            location_update_ms: 10,
            upload_interval_ms: 0,
            retry_interval_ms: 100,
        }
        .clamped();

        assert_eq!(options.sample_rate_hz, MAX_SAMPLE_RATE_HZ);
        assert_eq!(options.location_update_ms, MIN_LOCATION_UPDATE_MS);
        assert_eq!(options.upload_interval_ms, MIN_UPLOAD_INTERVAL_MS);
        assert_eq!(options.retry_interval_ms, MIN_RETRY_INTERVAL_MS);
    }

    #[test]
    fn zero_sample_rate_clamps_to_one() {
        let options = TelemetryOptions {
            sample_rate_hz: 0,
            ..TelemetryOptions::default()
        }
        .clamped();
        assert_eq!(options.sample_rate_hz, 1);
    }
}
