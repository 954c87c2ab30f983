//! Curator: a file-catalog maintenance daemon.
//!
//! Keeps a SQLite catalog in sync with a set of watched directory trees and
//! drives a two-stage deletion lifecycle over the catalogued files.
//!
//! # Architecture
//!
//! ```text
//!                      +----------------+
//!                      | RunCoordinator |   advisory full-scan flag
//!                      +-------+--------+
//!                              |
//!        +---------------------+---------------------+
//!        |                     |                     |
//!  full-scan job         deletion job           rename job
//!  (daily, 05:00)        (hourly)               (daily, 03:00)
//!        |                     |                     |
//!   Reconciler           LifecycleEngine       RenamePropagator
//!        |                     |                     |
//!        +----------+----------+----------+----------+
//!                   |                     |
//!              CuratorDb            remote files API
//! ```
//!
//! The reconciler ingests new files, re-homes moved ones and drops stale
//! records. The lifecycle engine consumes deletion flags. The propagator
//! pushes configured directory renames to the remote files API.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod jobs;
pub mod lifecycle;
pub mod probe;
pub mod reconcile;
pub mod rename;
pub mod scan;
pub mod schedule;
pub mod shutdown;

pub use api::{DirectoryChangeRequest, FilesApiClient, MetadataApi, RemoteFileDetail};
pub use config::{CuratorConfig, RenameRule};
pub use coordinator::RunCoordinator;
pub use error::{CuratorError, Disposition, Result};
pub use jobs::JobContext;
pub use lifecycle::LifecycleEngine;
pub use reconcile::Reconciler;
pub use rename::RenamePropagator;
pub use shutdown::{ShutdownHandle, ShutdownToken};
