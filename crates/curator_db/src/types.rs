//! Catalog entity types.
//!
//! These types are the single source of truth for everything persisted in the
//! catalog. The daemon crates use them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity of a catalogued file: `(directory, file_name)`.
///
/// Unique among live records; used for set arithmetic against disk snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileKey {
    pub directory: String,
    pub file_name: String,
}

impl FileKey {
    pub fn new(directory: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path of the file this key refers to.
    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.file_name)
    }
}

/// One catalogued file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Catalog identity (rowid).
    pub id: i64,
    /// Directory containing the file.
    pub directory: String,
    /// File name (no directory component).
    pub file_name: String,
    /// Size in bytes at ingest time.
    pub size: i64,
    /// Image width, if probed.
    pub width: Option<i64>,
    /// Image height, if probed.
    pub height: Option<i64>,
    /// Whether the extension classified this file as an image.
    pub is_image: bool,
}

impl FileRecord {
    /// Identity key of this record.
    pub fn key(&self) -> FileKey {
        FileKey::new(self.directory.clone(), self.file_name.clone())
    }

    /// Full on-disk path of this record.
    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.file_name)
    }
}

/// Deletion-lifecycle state attached to a [`FileRecord`] (1:1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessState {
    pub file_id: i64,
    pub soft_delete_pending: bool,
    pub soft_deleted: bool,
    pub hard_delete_pending: bool,
    pub last_updated: DateTime<Utc>,
}

impl AccessState {
    /// True when no deletion flag is set.
    pub fn is_active(&self) -> bool {
        !self.soft_delete_pending && !self.soft_deleted && !self.hard_delete_pending
    }
}

/// A file record waiting to be persisted, before it has an id.
///
/// The attached access state is always all-false: new sightings and re-homed
/// moves both start life with a clean slate.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub directory: String,
    pub file_name: String,
    pub size: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub is_image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_key_full_path_joins_components() {
        let key = FileKey::new("/data/photos", "sunset.jpg");
        assert_eq!(key.full_path(), PathBuf::from("/data/photos/sunset.jpg"));
    }

    #[test]
    fn access_state_active_only_when_all_flags_clear() {
        let mut state = AccessState {
            file_id: 1,
            soft_delete_pending: false,
            soft_deleted: false,
            hard_delete_pending: false,
            last_updated: Utc::now(),
        };
        assert!(state.is_active());

        state.soft_delete_pending = true;
        assert!(!state.is_active());
    }
}
