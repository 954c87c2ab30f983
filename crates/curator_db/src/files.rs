//! Catalog operations over file records and their access state.

use crate::error::Result;
use crate::types::{AccessState, FileKey, FileRecord, NewFileRecord};
use crate::CuratorDb;
use sqlx::Row;

const RECORD_COLUMNS: &str = "f.id, f.directory, f.file_name, f.size, f.width, f.height, f.is_image";

impl CuratorDb {
    // ========================================================================
    // Ingest / upsert
    // ========================================================================

    /// Persist a batch of new records in a single transaction.
    ///
    /// Upsert semantics on `(directory, file_name)`: a key collision replaces
    /// size/dimensions and resets the access state to all-false. Both new
    /// sightings and re-homed moves start with a clean lifecycle slate.
    pub async fn insert_files(&self, records: &[NewFileRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Self::now_millis();
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO files (directory, file_name, size, width, height, is_image)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(directory, file_name) DO UPDATE SET
                    size = excluded.size,
                    width = excluded.width,
                    height = excluded.height,
                    is_image = excluded.is_image
                "#,
            )
            .bind(&record.directory)
            .bind(&record.file_name)
            .bind(record.size)
            .bind(record.width)
            .bind(record.height)
            .bind(record.is_image)
            .execute(&mut *tx)
            .await?;

            let file_id: i64 =
                sqlx::query_scalar("SELECT id FROM files WHERE directory = ? AND file_name = ?")
                    .bind(&record.directory)
                    .bind(&record.file_name)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                r#"
                INSERT INTO file_access (file_id, soft_delete_pending, soft_deleted, hard_delete_pending, last_updated)
                VALUES (?, 0, 0, 0, ?)
                ON CONFLICT(file_id) DO UPDATE SET
                    soft_delete_pending = 0,
                    soft_deleted = 0,
                    hard_delete_pending = 0,
                    last_updated = excluded.last_updated
                "#,
            )
            .bind(file_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records.len() as u64)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// All catalog keys, purged records excluded by construction.
    pub async fn list_keys(&self) -> Result<Vec<FileKey>> {
        let rows = sqlx::query("SELECT directory, file_name FROM files")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| FileKey::new(row.get::<String, _>("directory"), row.get::<String, _>("file_name")))
            .collect())
    }

    /// Keys of records in the Active state (no deletion flag set).
    pub async fn list_active_keys(&self) -> Result<Vec<FileKey>> {
        let rows = sqlx::query(
            r#"
            SELECT f.directory, f.file_name
            FROM files f JOIN file_access a ON a.file_id = f.id
            WHERE a.soft_delete_pending = 0 AND a.soft_deleted = 0 AND a.hard_delete_pending = 0
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FileKey::new(row.get::<String, _>("directory"), row.get::<String, _>("file_name")))
            .collect())
    }

    /// Get a record by its key.
    pub async fn get_record(&self, directory: &str, file_name: &str) -> Result<Option<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM files f WHERE f.directory = ? AND f.file_name = ?"
        );
        let row = sqlx::query(&sql)
            .bind(directory)
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// Get a record by id.
    pub async fn get_record_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM files f WHERE f.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// Get the access state for a record.
    pub async fn get_access(&self, file_id: i64) -> Result<Option<AccessState>> {
        let row = sqlx::query(
            "SELECT file_id, soft_delete_pending, soft_deleted, hard_delete_pending, last_updated FROM file_access WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| AccessState {
            file_id: row.get("file_id"),
            soft_delete_pending: row.get("soft_delete_pending"),
            soft_deleted: row.get("soft_deleted"),
            hard_delete_pending: row.get("hard_delete_pending"),
            last_updated: Self::millis_to_datetime(row.get("last_updated")),
        }))
    }

    /// Records eligible for rename propagation: not soft-deleted, directory
    /// containing the given fragment.
    pub async fn list_renameable_containing(&self, fragment: &str) -> Result<Vec<FileRecord>> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM files f JOIN file_access a ON a.file_id = f.id
            WHERE a.soft_deleted = 0 AND instr(f.directory, ?) > 0
            ORDER BY f.id
            "#
        );
        let rows = sqlx::query(&sql).bind(fragment).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    // ========================================================================
    // Lifecycle flag queries
    // ========================================================================

    /// Records whose access state requests a soft delete.
    pub async fn list_soft_delete_pending(&self) -> Result<Vec<FileRecord>> {
        self.list_by_flag("a.soft_delete_pending = 1").await
    }

    /// Records whose access state requests a hard delete.
    pub async fn list_hard_delete_pending(&self) -> Result<Vec<FileRecord>> {
        self.list_by_flag("a.hard_delete_pending = 1").await
    }

    /// Records already soft-deleted (for the monthly re-assertion sweep).
    pub async fn list_soft_deleted(&self) -> Result<Vec<FileRecord>> {
        self.list_by_flag("a.soft_deleted = 1").await
    }

    async fn list_by_flag(&self, predicate: &str) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM files f JOIN file_access a ON a.file_id = f.id WHERE {predicate} ORDER BY f.id"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    // ========================================================================
    // Lifecycle flag mutations
    // ========================================================================

    /// Set the deletion flags on a record's access state directly.
    ///
    /// This is the administrative entry point; the daemon itself only ever
    /// consumes flags, it never raises the *_pending ones.
    pub async fn set_access_flags(
        &self,
        file_id: i64,
        soft_delete_pending: bool,
        soft_deleted: bool,
        hard_delete_pending: bool,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE file_access
            SET soft_delete_pending = ?, soft_deleted = ?, hard_delete_pending = ?, last_updated = ?
            WHERE file_id = ?
            "#,
        )
        .bind(soft_delete_pending)
        .bind(soft_deleted)
        .bind(hard_delete_pending)
        .bind(Self::now_millis())
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Finalize soft deletes in one batch: pending off, deleted on.
    ///
    /// Returns rows affected; zero for an id is benign (raced away).
    pub async fn finalize_soft_deletes(&self, file_ids: &[i64]) -> Result<u64> {
        self.update_flags_batch(
            file_ids,
            "soft_delete_pending = 0, soft_deleted = 1",
        )
        .await
    }

    /// Normalize previously soft-deleted records: both pending flags off,
    /// deleted stays on.
    pub async fn normalize_soft_deleted(&self, file_ids: &[i64]) -> Result<u64> {
        self.update_flags_batch(
            file_ids,
            "soft_delete_pending = 0, hard_delete_pending = 0, soft_deleted = 1",
        )
        .await
    }

    async fn update_flags_batch(&self, file_ids: &[i64], assignments: &str) -> Result<u64> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let now = Self::now_millis();
        let sql = format!(
            "UPDATE file_access SET {assignments}, last_updated = ? WHERE file_id = ?"
        );

        let mut affected = 0;
        let mut tx = self.pool.begin().await?;
        for file_id in file_ids {
            let result = sqlx::query(&sql)
                .bind(now)
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;

        Ok(affected)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a record and its access state entirely.
    pub async fn remove_record(&self, file_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM file_access WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Remove a record by key, if present. Returns rows affected (0 or 1).
    pub async fn remove_record_at(&self, directory: &str, file_name: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM file_access WHERE file_id IN (SELECT id FROM files WHERE directory = ? AND file_name = ?)",
        )
        .bind(directory)
        .bind(file_name)
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query("DELETE FROM files WHERE directory = ? AND file_name = ?")
            .bind(directory)
            .bind(file_name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Remove a batch of records (hard-delete sweep) in one transaction.
    pub async fn remove_records(&self, file_ids: &[i64]) -> Result<u64> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let mut affected = 0;
        let mut tx = self.pool.begin().await?;
        for file_id in file_ids {
            sqlx::query("DELETE FROM file_access WHERE file_id = ?")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            let result = sqlx::query("DELETE FROM files WHERE id = ?")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;

        Ok(affected)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Number of file records.
    pub async fn count_files(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of access-state rows. Always equals `count_files` unless
    /// something went wrong with ownership.
    pub async fn count_access(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM file_access")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> FileRecord {
    FileRecord {
        id: row.get("id"),
        directory: row.get("directory"),
        file_name: row.get("file_name"),
        size: row.get("size"),
        width: row.get("width"),
        height: row.get("height"),
        is_image: row.get("is_image"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_db() -> (TempDir, CuratorDb) {
        let tmp = TempDir::new().unwrap();
        let db = CuratorDb::open(tmp.path().join("catalog.db")).await.unwrap();
        (tmp, db)
    }

    fn record(directory: &str, file_name: &str) -> NewFileRecord {
        NewFileRecord {
            directory: directory.to_string(),
            file_name: file_name.to_string(),
            size: 42,
            width: None,
            height: None,
            is_image: false,
        }
    }

    #[tokio::test]
    async fn insert_creates_record_and_access_state() {
        let (_tmp, db) = temp_db().await;

        db.insert_files(&[record("/data", "a.txt")]).await.unwrap();

        let stored = db.get_record("/data", "a.txt").await.unwrap().unwrap();
        assert_eq!(stored.size, 42);
        assert!(!stored.is_image);

        let access = db.get_access(stored.id).await.unwrap().unwrap();
        assert!(access.is_active());
        assert_eq!(db.count_files().await.unwrap(), 1);
        assert_eq!(db.count_access().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_on_key_collision_resets_flags() {
        let (_tmp, db) = temp_db().await;

        db.insert_files(&[record("/data", "a.txt")]).await.unwrap();
        let stored = db.get_record("/data", "a.txt").await.unwrap().unwrap();
        db.set_access_flags(stored.id, true, false, false).await.unwrap();

        let mut replacement = record("/data", "a.txt");
        replacement.size = 100;
        db.insert_files(&[replacement]).await.unwrap();

        let stored = db.get_record("/data", "a.txt").await.unwrap().unwrap();
        assert_eq!(stored.size, 100);
        let access = db.get_access(stored.id).await.unwrap().unwrap();
        assert!(access.is_active());
        assert_eq!(db.count_files().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn flag_queries_partition_records() {
        let (_tmp, db) = temp_db().await;

        db.insert_files(&[
            record("/data", "active.txt"),
            record("/data", "soft.txt"),
            record("/data", "hard.txt"),
        ])
        .await
        .unwrap();

        let soft = db.get_record("/data", "soft.txt").await.unwrap().unwrap();
        let hard = db.get_record("/data", "hard.txt").await.unwrap().unwrap();
        db.set_access_flags(soft.id, true, false, false).await.unwrap();
        db.set_access_flags(hard.id, false, false, true).await.unwrap();

        let pending = db.list_soft_delete_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_name, "soft.txt");

        let condemned = db.list_hard_delete_pending().await.unwrap();
        assert_eq!(condemned.len(), 1);
        assert_eq!(condemned[0].file_name, "hard.txt");

        let active = db.list_active_keys().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].file_name, "active.txt");
    }

    #[tokio::test]
    async fn remove_record_drops_both_rows() {
        let (_tmp, db) = temp_db().await;

        db.insert_files(&[record("/data", "a.txt")]).await.unwrap();
        let stored = db.get_record("/data", "a.txt").await.unwrap().unwrap();

        let affected = db.remove_record(stored.id).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(db.count_files().await.unwrap(), 0);
        assert_eq!(db.count_access().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn renameable_excludes_soft_deleted() {
        let (_tmp, db) = temp_db().await;

        db.insert_files(&[
            record("/archive/2020", "a.txt"),
            record("/archive/2021", "b.txt"),
        ])
        .await
        .unwrap();

        let b = db.get_record("/archive/2021", "b.txt").await.unwrap().unwrap();
        db.set_access_flags(b.id, false, true, false).await.unwrap();

        let matches = db.list_renameable_containing("/archive").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file_name, "a.txt");
    }

    #[tokio::test]
    async fn finalize_soft_deletes_reports_zero_for_missing_ids() {
        let (_tmp, db) = temp_db().await;

        let affected = db.finalize_soft_deletes(&[999]).await.unwrap();
        assert_eq!(affected, 0);
    }
}
