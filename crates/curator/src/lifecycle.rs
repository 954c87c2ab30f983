//! Deletion-lifecycle sweeps.
//!
//! Flags on a record's access state are raised elsewhere (an operator tool,
//! the remote service); the sweeps here only ever consume them:
//!
//! - hard-delete-pending: remove the file and purge the record,
//! - soft-delete-pending: remove the file, keep the record as soft-deleted,
//! - soft-deleted (monthly): re-assert the file's absence.

use crate::error::{CuratorError, Disposition, Result};
use crate::shutdown::ShutdownToken;
use curator_db::{CuratorDb, FileRecord};
use std::path::Path;
use tracing::{debug, info, warn};

pub struct LifecycleEngine {
    db: CuratorDb,
}

impl LifecycleEngine {
    pub fn new(db: CuratorDb) -> Self {
        Self { db }
    }

    /// Remove every record marked hard-delete-pending, file first.
    ///
    /// Destructive and idempotent: a file already gone from disk does not
    /// stop the record purge.
    pub async fn sweep_hard_delete_pending(&self, shutdown: &ShutdownToken) -> Result<u64> {
        let records = self.db.list_hard_delete_pending().await?;
        info!(count = records.len(), "Sweeping records marked for hard deletion");

        let mut done = Vec::with_capacity(records.len());
        for record in &records {
            if shutdown.is_cancelled() {
                break;
            }
            info!(file = %record.full_path().display(), "Hard-deleting file");
            delete_file_if_exists(&record.full_path());
            done.push(record.id);
        }

        let removed = self.db.remove_records(&done).await?;
        if removed < done.len() as u64 {
            debug!(expected = done.len(), removed, "Some hard-deleted records were already gone");
        }
        info!(removed, "Hard-delete sweep complete");
        Ok(removed)
    }

    /// Finalize every record marked soft-delete-pending: file removed from
    /// disk, record retained with `soft_deleted` set.
    pub async fn sweep_soft_delete_pending(&self, shutdown: &ShutdownToken) -> Result<u64> {
        let records = self.db.list_soft_delete_pending().await?;
        info!(count = records.len(), "Sweeping records marked for soft deletion");

        let done = self.delete_files(&records, shutdown);
        let updated = self.db.finalize_soft_deletes(&done).await?;
        if updated < done.len() as u64 {
            debug!(expected = done.len(), updated, "Some soft-delete rows were already gone");
        }
        info!(updated, "Soft-delete sweep complete");
        Ok(updated)
    }

    /// Monthly re-assertion: every soft-deleted record gets its file deleted
    /// again, in case something restored it, and its pending flags cleared.
    pub async fn sweep_previously_soft_deleted(&self, shutdown: &ShutdownToken) -> Result<u64> {
        let records = self.db.list_soft_deleted().await?;
        info!(count = records.len(), "Re-asserting previously soft-deleted records");

        let done = self.delete_files(&records, shutdown);
        let updated = self.db.normalize_soft_deleted(&done).await?;
        info!(updated, "Re-assertion sweep complete");
        Ok(updated)
    }

    fn delete_files(&self, records: &[FileRecord], shutdown: &ShutdownToken) -> Vec<i64> {
        let mut done = Vec::with_capacity(records.len());
        for record in records {
            if shutdown.is_cancelled() {
                break;
            }
            delete_file_if_exists(&record.full_path());
            done.push(record.id);
        }
        done
    }
}

/// Delete a file from disk, treating absence as success.
///
/// Never fails: a file that cannot be deleted must not block the catalog
/// side of the sweep. Both outcomes are logged.
pub(crate) fn delete_file_if_exists(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        let err = CuratorError::from(err);
        match err.disposition() {
            Disposition::Ignore => {
                warn!(file = %path.display(), "File already absent when deleting");
            }
            _ => {
                warn!(file = %path.display(), error = %err, "Failed to delete file from disk");
            }
        }
    }
}
