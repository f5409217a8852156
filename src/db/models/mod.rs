//! Durable batch row model.

/// One persisted telemetry batch awaiting delivery.
///
/// Rows are immutable except for `attempt_count`; they disappear only on
/// upload success, permanent rejection, or stale eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBatch {
    /// Autoincrement row id.
    pub id: i64,
    /// Session the batch was recorded under. Retries always upload with
    /// this id, never the currently active one.
    pub session_id: String,
    /// JSON array of samples exactly as drained from the buffer.
    pub samples_json: String,
    pub sample_count: u64,
    /// Insertion wall time, epoch milliseconds. Drives FIFO processing.
    pub created_at_ms: i64,
    pub attempt_count: u32,
}
