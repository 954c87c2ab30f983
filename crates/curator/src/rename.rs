//! Directory rename propagation.
//!
//! For each configured rule, every non-soft-deleted record whose directory
//! contains the rule's `old` fragment gets a directory change pushed to the
//! remote files API. One refused file never stops the rest.

use crate::api::{DirectoryChangeRequest, MetadataApi};
use crate::config::RenameRule;
use crate::error::{Disposition, Result};
use crate::shutdown::ShutdownToken;
use curator_db::{CuratorDb, FileRecord};
use tracing::{debug, error, info};

pub struct RenamePropagator<A> {
    db: CuratorDb,
    api: A,
}

impl<A: MetadataApi> RenamePropagator<A> {
    pub fn new(db: CuratorDb, api: A) -> Self {
        Self { db, api }
    }

    /// Apply every rule in order. Per-record failures are logged and
    /// skipped; the count of successful pushes is returned.
    pub async fn apply_renames(
        &self,
        rules: &[RenameRule],
        shutdown: &ShutdownToken,
    ) -> Result<u64> {
        let mut pushed = 0;
        for rule in rules {
            info!(old = %rule.old, new = %rule.new, "Applying directory rename rule");
            let records = self.db.list_renameable_containing(&rule.old).await?;
            info!(count = records.len(), "Records matching rename rule");

            for record in &records {
                if shutdown.is_cancelled() {
                    return Ok(pushed);
                }
                match self.push_rename(record, rule).await {
                    Ok(()) => pushed += 1,
                    Err(err) => match err.disposition() {
                        Disposition::Fail => return Err(err),
                        Disposition::Warn => {
                            error!(
                                file = %record.full_path().display(),
                                error = %err,
                                "Failed to propagate directory rename"
                            );
                        }
                        Disposition::Ignore => {
                            debug!(file = %record.full_path().display(), "Rename target already gone");
                        }
                    },
                }
            }
        }
        Ok(pushed)
    }

    async fn push_rename(&self, record: &FileRecord, rule: &RenameRule) -> Result<()> {
        // The remote service owns the canonical directory; fetch it rather
        // than trusting the local catalog copy.
        let detail = self.api.file_detail(record.id).await?;
        let new_directory = detail.directory_name.replace(&rule.old, &rule.new);

        self.api
            .update_directory(&DirectoryChangeRequest {
                old_directory_name: detail.directory_name,
                new_directory_name: new_directory,
                file_name: detail.file_name,
            })
            .await?;
        Ok(())
    }
}
