//! Database schema creation for the catalog tables.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::CuratorDb;
use tracing::info;

impl CuratorDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // Enable WAL mode for better concurrent access
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        // Files: one row per catalogued file. Width/height stay NULL unless
        // the file was classified as an image and the probe succeeded.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                directory TEXT NOT NULL,
                file_name TEXT NOT NULL,
                size INTEGER NOT NULL,
                width INTEGER,
                height INTEGER,
                is_image INTEGER NOT NULL DEFAULT 0,
                UNIQUE(directory, file_name)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // Access state: deletion-lifecycle flags, exactly one row per file.
        // Rows live and die with their file row.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS file_access (
                file_id INTEGER PRIMARY KEY REFERENCES files(id) ON DELETE CASCADE,
                soft_delete_pending INTEGER NOT NULL DEFAULT 0,
                soft_deleted INTEGER NOT NULL DEFAULT 0,
                hard_delete_pending INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_directory ON files(directory)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_name ON files(file_name)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_access_pending ON file_access(soft_delete_pending, hard_delete_pending, soft_deleted)",
        )
        .execute(&self.pool)
        .await?;

        info!("Catalog schema verified");
        Ok(())
    }
}
