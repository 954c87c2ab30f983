//! Error types for the daemon crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CuratorError>;

#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("Catalog error: {0}")]
    Db(#[from] curator_db::DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Remote API rejected the request: {0}")]
    ApiRejected(String),

    #[error("Image probe failed: {0}")]
    Probe(#[from] image::ImageError),
}

/// How a failure should be handled at the point it surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expected no-op (absent file, raced-away row). Log at debug and move on.
    Ignore,
    /// Per-item failure. Log a warning, skip the item, keep going.
    Warn,
    /// The whole cycle cannot proceed. Propagate to the job loop.
    Fail,
}

impl CuratorError {
    pub fn config(msg: impl Into<String>) -> Self {
        CuratorError::Config(msg.into())
    }

    pub fn api_rejected(msg: impl Into<String>) -> Self {
        CuratorError::ApiRejected(msg.into())
    }

    /// Classify this error for the sweep and reconciliation loops.
    ///
    /// Item-level trouble (a file that vanished, an unreadable image, one
    /// remote call refused) must never abort a whole pass; catalog and
    /// configuration failures must.
    pub fn disposition(&self) -> Disposition {
        match self {
            CuratorError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Disposition::Ignore
            }
            CuratorError::Io(_) => Disposition::Warn,
            CuratorError::Probe(_) => Disposition::Warn,
            CuratorError::Api(_) | CuratorError::ApiRejected(_) => Disposition::Warn,
            CuratorError::Db(_) | CuratorError::Config(_) => Disposition::Fail,
        }
    }
}
