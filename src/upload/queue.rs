//! Store-and-forward upload queue.
//!
//! Persist first, transmit second. A batch handed to `enqueue` is written
//! to the store before the first upload attempt, so process death at any
//! point afterwards leaves a row the next sweep can deliver. Retried rows
//! upload under the session id they were recorded with, never the
//! currently active one.

use anyhow::{Context, Result};

use crate::db::{BatchStore, PendingBatch};
use crate::http::TelemetryApi;
use crate::models::wire::TelemetryRequest;
use crate::models::Sample;
use crate::{sdk_info, sdk_warn};

use super::classifier::UploadOutcome;

/// Retry ceiling: a row failing this many times is evicted at the next
/// sweep.
pub const MAX_ATTEMPTS: u32 = 10;

pub struct UploadQueue {
    store: BatchStore,
    api: TelemetryApi,
    max_attempts: u32,
}

impl UploadQueue {
    pub fn new(store: BatchStore, api: TelemetryApi) -> Self {
        Self {
            store,
            api,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Persists the batch, then attempts one upload.
    pub async fn enqueue(&self, session_id: &str, samples: Vec<Sample>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let samples_json =
            serde_json::to_string(&samples).context("failed to serialize sample batch")?;
        let id = self
            .store
            .insert_pending_batch(session_id, samples_json, samples.len())
            .await?;

        let request = TelemetryRequest {
            session_id: session_id.to_string(),
            events: samples,
        };
        let result = self.api.upload_telemetry(&request).await;
        self.apply_outcome(id, session_id, &result).await
    }

    /// Sweeps the store: evicts exhausted rows, then re-uploads every
    /// pending batch oldest-first under its stored session id.
    pub async fn process_pending(&self) -> Result<()> {
        self.evict_stale().await?;
        let rows = self.store.all_pending_batches().await?;
        self.upload_rows(rows).await
    }

    /// Same sweep, scoped to one session's rows.
    pub async fn process_pending_for(&self, session_id: &str) -> Result<()> {
        self.evict_stale().await?;
        let rows = self.store.pending_batches_for(session_id).await?;
        self.upload_rows(rows).await
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.store.pending_batch_count().await
    }

    async fn evict_stale(&self) -> Result<()> {
        let evicted = self.store.evict_stale_batches(self.max_attempts).await?;
        if evicted > 0 {
            sdk_warn!(
                "evicted {evicted} batch(es) after {} failed attempts",
                self.max_attempts
            );
        }
        Ok(())
    }

    async fn upload_rows(&self, rows: Vec<PendingBatch>) -> Result<()> {
        for row in rows {
            let samples: Vec<Sample> = match serde_json::from_str(&row.samples_json) {
                Ok(samples) => samples,
                Err(err) => {
                    // A row that cannot be decoded can never be delivered.
                    sdk_warn!("dropping undecodable batch {}: {err}", row.id);
                    self.store.delete_pending_batch(row.id).await?;
                    continue;
                }
            };

            let request = TelemetryRequest {
                session_id: row.session_id.clone(),
                events: samples,
            };
            let result = self.api.upload_telemetry(&request).await;
            self.apply_outcome(row.id, &row.session_id, &result).await?;
        }
        Ok(())
    }

    async fn apply_outcome(
        &self,
        id: i64,
        session_id: &str,
        result: &Result<(), crate::error::TransportError>,
    ) -> Result<()> {
        match UploadOutcome::classify(result) {
            UploadOutcome::Success => {
                self.store.delete_pending_batch(id).await?;
                sdk_info!("batch {id} delivered for session {session_id}");
            }
            UploadOutcome::Retryable => {
                self.store.increment_batch_attempts(id).await?;
                if let Err(err) = result {
                    sdk_info!("batch {id} retained for retry: {err}");
                }
            }
            UploadOutcome::Permanent => {
                self.store.delete_pending_batch(id).await?;
                if let Err(err) = result {
                    sdk_warn!("batch {id} permanently rejected, discarding: {err}");
                }
            }
        }
        Ok(())
    }
}
