//! SQLite-backed pending-batch store.
//!
//! The workload is one append-heavy table: a row per flushed batch,
//! scanned by the retry sweep, deleted on acknowledgement. That shape
//! needs no dedicated writer thread; the connection sits behind a blocking
//! mutex and each operation hops to tokio's blocking pool, so callers
//! suspend instead of stalling the runtime while SQLite touches disk.
//! Every operation runs as its own implicit transaction, which is exactly
//! the one-op-one-transaction serialisation the upload queue relies on.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

mod schema;

pub mod helpers;
pub mod models;
pub mod repositories;

pub use models::PendingBatch;

use crate::sdk_info;

/// Handle to the process-wide pending-batch store. Clones share one
/// connection; the store outlives sessions so retries stay durable across
/// them.
#[derive(Clone)]
pub struct BatchStore {
    conn: Arc<Mutex<Connection>>,
    path: Arc<PathBuf>,
}

impl BatchStore {
    /// Opens the store at `path`, creating the file and any missing parent
    /// directories, and brings the schema up to date.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory {}", parent.display()))?;
        }

        let mut conn = Connection::open(&path)
            .with_context(|| format!("failed to open batch store at {}", path.display()))?;
        // WAL keeps the flush loop's inserts and the retry sweep's scans
        // out of each other's way.
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL mode")?;
        schema::prepare(&mut conn)?;

        sdk_info!("pending-batch store ready at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Runs one store operation on the blocking pool. The mutex serialises
    /// concurrent callers; a panicking operation poisons nothing the next
    /// caller cannot recover.
    pub(crate) async fn call<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = match conn.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            op(&guard)
        })
        .await
        .map_err(|err| anyhow!("store operation did not complete: {err}"))?
    }
}
