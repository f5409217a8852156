//! Pending-batch repository.
//!
//! Each method submits one closure to the store, so each is an independent
//! transaction. Ordering contract: scans return rows by ascending
//! `created_at`, with the row id as tiebreak for batches persisted within
//! the same millisecond.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{to_i64, to_u32, to_u64},
    models::PendingBatch,
    BatchStore,
};

fn row_to_batch(row: &Row) -> Result<PendingBatch> {
    let sample_count: i64 = row.get("sample_count")?;
    let attempt_count: i64 = row.get("attempt_count")?;

    Ok(PendingBatch {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        samples_json: row.get("samples_json")?,
        sample_count: to_u64(sample_count, "sample_count")?,
        created_at_ms: row.get("created_at")?,
        attempt_count: to_u32(attempt_count, "attempt_count")?,
    })
}

const SELECT_COLUMNS: &str =
    "id, session_id, samples_json, sample_count, created_at, attempt_count";

impl BatchStore {
    /// Inserts a batch and returns its row id.
    pub async fn insert_pending_batch(
        &self,
        session_id: &str,
        samples_json: String,
        sample_count: usize,
    ) -> Result<i64> {
        let session_id = session_id.to_string();
        let created_at_ms = Utc::now().timestamp_millis();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO pending_telemetry
                    (session_id, samples_json, sample_count, created_at, attempt_count)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![
                    session_id,
                    samples_json,
                    to_i64(sample_count as u64)?,
                    created_at_ms,
                ],
            )
            .context("failed to insert pending batch")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Every pending row, oldest first.
    pub async fn all_pending_batches(&self) -> Result<Vec<PendingBatch>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM pending_telemetry
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_and_then([], |row| row_to_batch(row))?;
            rows.collect()
        })
        .await
    }

    /// Pending rows for one session, oldest first.
    pub async fn pending_batches_for(&self, session_id: &str) -> Result<Vec<PendingBatch>> {
        let session_id = session_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM pending_telemetry
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_and_then(params![session_id], |row| row_to_batch(row))?;
            rows.collect()
        })
        .await
    }

    /// Idempotent delete.
    pub async fn delete_pending_batch(&self, id: i64) -> Result<()> {
        self.call(move |conn| {
            conn.execute("DELETE FROM pending_telemetry WHERE id = ?1", params![id])
                .context("failed to delete pending batch")?;
            Ok(())
        })
        .await
    }

    pub async fn increment_batch_attempts(&self, id: i64) -> Result<()> {
        self.call(move |conn| {
            conn.execute(
                "UPDATE pending_telemetry
                 SET attempt_count = attempt_count + 1
                 WHERE id = ?1",
                params![id],
            )
            .context("failed to increment attempt count")?;
            Ok(())
        })
        .await
    }

    /// Deletes every row that has exhausted its retries. Returns the
    /// number of rows evicted.
    pub async fn evict_stale_batches(&self, max_attempts: u32) -> Result<usize> {
        self.call(move |conn| {
            let evicted = conn
                .execute(
                    "DELETE FROM pending_telemetry WHERE attempt_count >= ?1",
                    params![max_attempts],
                )
                .context("failed to evict stale batches")?;
            Ok(evicted)
        })
        .await
    }

    pub async fn pending_batch_count(&self) -> Result<usize> {
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM pending_telemetry",
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}
