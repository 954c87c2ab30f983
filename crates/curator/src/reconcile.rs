//! Full reconciliation of the catalog against the watched trees.
//!
//! A pass runs three stages in order over one disk snapshot:
//!
//! 1. ingest files not yet catalogued,
//! 2. re-home records whose file moved within a watched root,
//! 3. remove records for files no longer on disk.
//!
//! Stage planning is pure set arithmetic over snapshots; only the appliers
//! touch the catalog and the filesystem.

use crate::error::{Disposition, Result};
use crate::probe;
use crate::scan;
use crate::shutdown::ShutdownToken;
use curator_db::{CuratorDb, FileKey, NewFileRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Disk keys with no catalog record yet.
pub fn plan_ingest(disk: &[FileKey], catalog: &HashSet<FileKey>) -> Vec<FileKey> {
    disk.iter()
        .filter(|key| !catalog.contains(key))
        .cloned()
        .collect()
}

/// Pairs of `(old, new)` keys where a catalogued file appears to have moved:
/// same file name, different directory, both directories under the same
/// watched root. A file never moves across roots.
pub fn plan_moves(
    disk: &[FileKey],
    catalog: &[FileKey],
    roots: &[String],
) -> Vec<(FileKey, FileKey)> {
    let mut moves = Vec::new();
    for root in roots {
        let mut by_name: HashMap<&str, Vec<&FileKey>> = HashMap::new();
        for key in catalog.iter().filter(|k| k.directory.starts_with(root.as_str())) {
            by_name.entry(key.file_name.as_str()).or_default().push(key);
        }

        for key in disk.iter().filter(|k| k.directory.starts_with(root.as_str())) {
            let Some(candidates) = by_name.get(key.file_name.as_str()) else {
                continue;
            };
            if let Some(old) = candidates.iter().find(|c| c.directory != key.directory) {
                moves.push(((*old).clone(), key.clone()));
            }
        }
    }
    moves
}

/// Catalogued Active keys whose file is gone from disk.
///
/// Records with any deletion flag set are left alone; their file's absence
/// is the lifecycle sweeps' business, not stale cleanup's.
pub fn plan_stale(disk: &HashSet<FileKey>, active: &[FileKey]) -> Vec<FileKey> {
    active
        .iter()
        .filter(|key| !disk.contains(key))
        .cloned()
        .collect()
}

pub struct Reconciler {
    db: CuratorDb,
    roots: Vec<String>,
    batch_size: usize,
}

impl Reconciler {
    pub fn new(db: CuratorDb, roots: Vec<String>, batch_size: usize) -> Self {
        Self {
            db,
            roots,
            batch_size: batch_size.max(1),
        }
    }

    /// One full reconciliation pass over all watched roots.
    pub async fn run_full_pass(&self, shutdown: &ShutdownToken) -> Result<()> {
        info!(roots = self.roots.len(), "Starting full reconciliation pass");
        let disk = scan::snapshot(&self.roots);
        info!(files = disk.len(), "Disk snapshot complete");

        self.ingest_new_files(&disk, shutdown).await?;
        if shutdown.is_cancelled() {
            return Ok(());
        }
        self.relocate_moved_files(&disk, shutdown).await?;
        if shutdown.is_cancelled() {
            return Ok(());
        }
        self.remove_stale_records(&disk).await?;

        info!("Full reconciliation pass complete");
        Ok(())
    }

    /// Stage 1: catalogue files seen on disk for the first time.
    pub async fn ingest_new_files(
        &self,
        disk: &[FileKey],
        shutdown: &ShutdownToken,
    ) -> Result<()> {
        let catalog: HashSet<FileKey> = self.db.list_keys().await?.into_iter().collect();
        let new_keys = plan_ingest(disk, &catalog);
        info!(count = new_keys.len(), "Ingesting files not yet catalogued");

        let mut batch = Vec::with_capacity(self.batch_size);
        for key in new_keys {
            if shutdown.is_cancelled() {
                self.db.insert_files(&batch).await?;
                info!("Ingest cancelled; partial batch flushed");
                return Ok(());
            }

            match self.build_record(&key) {
                Ok(record) => batch.push(record),
                Err(err) => match err.disposition() {
                    Disposition::Fail => return Err(err),
                    Disposition::Warn => {
                        warn!(file = %key.full_path().display(), error = %err, "Skipping file")
                    }
                    Disposition::Ignore => {
                        debug!(file = %key.full_path().display(), "File vanished before ingest")
                    }
                },
            }

            if batch.len() >= self.batch_size {
                self.db.insert_files(&batch).await?;
                debug!(count = batch.len(), "Ingest batch persisted");
                batch.clear();
            }
        }
        self.db.insert_files(&batch).await?;
        Ok(())
    }

    /// Build the record for one new sighting, probing image headers.
    ///
    /// The caller skips or aborts based on the error's disposition. An image
    /// whose header will not parse is junk data: it is deleted from disk so
    /// it stops turning up in every future scan.
    fn build_record(&self, key: &FileKey) -> Result<NewFileRecord> {
        let path = key.full_path();
        let metadata = std::fs::metadata(&path)?;

        let is_image = probe::is_image_path(&path);
        let (mut width, mut height) = (None, None);
        if is_image {
            match probe::probe_dimensions(&path) {
                Ok((w, h)) => {
                    width = Some(w as i64);
                    height = Some(h as i64);
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "Unreadable image; deleting from disk");
                    if let Err(err) = std::fs::remove_file(&path) {
                        warn!(file = %path.display(), error = %err, "Failed to delete unreadable image");
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(NewFileRecord {
            directory: key.directory.clone(),
            file_name: key.file_name.clone(),
            size: metadata.len() as i64,
            width,
            height,
            is_image,
        })
    }

    /// Stage 2: re-home records whose file moved inside a watched root.
    ///
    /// The old record's size and dimensions are carried over; its lifecycle
    /// state is not. Both the old record and any record already sitting at
    /// the new key are removed before the carried-over row is inserted.
    pub async fn relocate_moved_files(
        &self,
        disk: &[FileKey],
        shutdown: &ShutdownToken,
    ) -> Result<()> {
        let catalog = self.db.list_keys().await?;
        let moves = plan_moves(disk, &catalog, &self.roots);
        info!(count = moves.len(), "Re-homing moved files");

        for (old_key, new_key) in moves {
            if shutdown.is_cancelled() {
                return Ok(());
            }

            let Some(old) = self.db.get_record(&old_key.directory, &old_key.file_name).await?
            else {
                // Raced away, likely by an earlier move of the same name.
                debug!(file = %old_key.full_path().display(), "Move source record already gone");
                continue;
            };

            info!(
                file = %new_key.file_name,
                from = %old.directory,
                to = %new_key.directory,
                "File appears to have moved; re-homing record"
            );

            self.db.remove_record(old.id).await?;
            self.db
                .remove_record_at(&new_key.directory, &new_key.file_name)
                .await?;
            self.db
                .insert_files(&[NewFileRecord {
                    directory: new_key.directory.clone(),
                    file_name: new_key.file_name.clone(),
                    size: old.size,
                    width: old.width,
                    height: old.height,
                    is_image: old.is_image,
                }])
                .await?;
        }
        Ok(())
    }

    /// Stage 3: drop Active records whose file no longer exists on disk.
    pub async fn remove_stale_records(&self, disk: &[FileKey]) -> Result<()> {
        let disk_set: HashSet<FileKey> = disk.iter().cloned().collect();
        let active = self.db.list_active_keys().await?;
        let stale = plan_stale(&disk_set, &active);
        info!(count = stale.len(), "Removing records for files gone from disk");

        for key in &stale {
            let removed = self
                .db
                .remove_record_at(&key.directory, &key.file_name)
                .await?;
            if removed == 0 {
                debug!(file = %key.full_path().display(), "Stale record already gone");
            }
        }
        Ok(())
    }
}
