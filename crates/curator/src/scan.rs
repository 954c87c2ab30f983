//! Disk snapshots of the watched trees.

use curator_db::FileKey;
use std::path::{Path, PathBuf};
use tracing::warn;

/// List every regular file under `root`, recursively.
///
/// Unreadable entries (permissions, vanished directories) are skipped with a
/// warning rather than failing the scan.
pub fn list_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root.as_ref())
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry during scan");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Snapshot of all watched roots as catalog keys.
///
/// Paths that cannot be split into `(directory, file_name)` are skipped with
/// a warning.
pub fn snapshot(roots: &[String]) -> Vec<FileKey> {
    let mut keys = Vec::new();
    for root in roots {
        for path in list_files(root) {
            match key_for_path(&path) {
                Some(key) => keys.push(key),
                None => warn!(path = %path.display(), "Skipping path with no usable directory/name split"),
            }
        }
    }
    keys
}

/// Split a path into its catalog key, or `None` if either component is
/// missing or not valid UTF-8.
pub fn key_for_path(path: &Path) -> Option<FileKey> {
    let directory = path.parent()?.to_str()?;
    let file_name = path.file_name()?.to_str()?;
    if directory.is_empty() {
        return None;
    }
    Some(FileKey::new(directory, file_name))
}
