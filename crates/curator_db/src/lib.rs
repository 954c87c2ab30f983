//! Catalog store for Curator.
//!
//! This crate is the single source of truth for catalog persistence. Every
//! interface (the daemon jobs, tests, future tooling) goes through
//! [`CuratorDb`]; nothing else touches the database directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use curator_db::{CuratorDb, Result};
//!
//! let db = CuratorDb::open("~/.curator/catalog.sqlite3").await?;
//!
//! let keys = db.list_keys().await?;
//! let pending = db.list_soft_delete_pending().await?;
//! ```

mod error;
mod files;
mod schema;
mod types;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Catalog database handle.
///
/// Cheap to clone; all clones share the same connection pool.
#[derive(Clone)]
pub struct CuratorDb {
    pool: SqlitePool,
}

impl CuratorDb {
    /// Open or create a catalog database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };

        db.ensure_schema().await?;

        info!(path = %path.display(), "Catalog database opened");

        Ok(db)
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl CuratorDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}
