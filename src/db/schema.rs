//! Schema management for the pending-batch store.
//!
//! `user_version` records how many of the ordered steps have been applied;
//! opening a store written by a newer build is refused rather than guessed
//! at.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const STEPS: &[&str] = &[include_str!("schemas/schema_v1.sql")];

pub fn prepare(conn: &mut Connection) -> Result<()> {
    let applied: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")?;
    let target = STEPS.len() as i64;

    if applied > target {
        bail!("store schema version {applied} is newer than this build supports ({target})");
    }
    if applied == target {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to begin schema transaction")?;
    for (index, step) in STEPS.iter().enumerate().skip(applied as usize) {
        tx.execute_batch(step)
            .with_context(|| format!("schema step {} failed", index + 1))?;
    }
    tx.pragma_update(None, "user_version", target)
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit schema changes")?;

    Ok(())
}
