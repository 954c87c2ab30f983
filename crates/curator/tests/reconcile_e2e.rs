//! End-to-end reconciliation and job-gating tests over a real directory
//! tree and a file-backed catalog.

use curator::{jobs, shutdown, CuratorConfig, JobContext, LifecycleEngine, Reconciler, RunCoordinator, ShutdownToken};
use curator_db::{CuratorDb, FileKey, NewFileRecord};
use tempfile::TempDir;

/// Smallest well-formed 1x1 RGBA PNG.
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

struct Fixture {
    tree: TempDir,
    db: CuratorDb,
    token: ShutdownToken,
    _handle: shutdown::ShutdownHandle,
}

impl Fixture {
    async fn new() -> Self {
        let tree = TempDir::new().unwrap();
        let db = CuratorDb::open(tree.path().join(".catalog/catalog.db"))
            .await
            .unwrap();
        let (_handle, token) = shutdown::channel();
        Self {
            tree,
            db,
            token,
            _handle,
        }
    }

    fn root(&self) -> String {
        self.tree.path().join("media").display().to_string()
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.db.clone(), vec![self.root()], 20)
    }

    fn write(&self, relative: &str, content: &[u8]) -> std::path::PathBuf {
        let path = self.tree.path().join("media").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn split(path: &std::path::Path) -> (String, String) {
    (
        path.parent().unwrap().display().to_string(),
        path.file_name().unwrap().to_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn full_pass_ingests_and_is_idempotent() {
    let fx = Fixture::new().await;
    fx.write("a.txt", b"alpha");
    fx.write("sub/b.txt", b"bravo");
    let photo = fx.write("sub/photo.png", TINY_PNG);

    let reconciler = fx.reconciler();
    reconciler.run_full_pass(&fx.token).await.unwrap();

    assert_eq!(fx.db.count_files().await.unwrap(), 3);
    let (dir, name) = split(&photo);
    let record = fx.db.get_record(&dir, &name).await.unwrap().unwrap();
    assert!(record.is_image);
    assert_eq!(record.width, Some(1));
    assert_eq!(record.height, Some(1));
    let first_id = record.id;

    // A second pass over unchanged disk must not churn the catalog.
    reconciler.run_full_pass(&fx.token).await.unwrap();
    assert_eq!(fx.db.count_files().await.unwrap(), 3);
    let record = fx.db.get_record(&dir, &name).await.unwrap().unwrap();
    assert_eq!(record.id, first_id);
}

#[tokio::test]
async fn moved_file_is_rehomed_with_a_clean_slate() {
    let fx = Fixture::new().await;
    let old_path = fx.write("old/photo.png", TINY_PNG);

    let reconciler = fx.reconciler();
    reconciler.run_full_pass(&fx.token).await.unwrap();

    let (old_dir, name) = split(&old_path);
    let old = fx.db.get_record(&old_dir, &name).await.unwrap().unwrap();
    fx.db.set_access_flags(old.id, true, false, false).await.unwrap();

    // Move the file on disk.
    let new_path = fx.tree.path().join("media/new/photo.png");
    std::fs::create_dir_all(new_path.parent().unwrap()).unwrap();
    std::fs::rename(&old_path, &new_path).unwrap();

    reconciler.run_full_pass(&fx.token).await.unwrap();

    assert!(fx.db.get_record(&old_dir, &name).await.unwrap().is_none());
    let (new_dir, _) = split(&new_path);
    let rehomed = fx.db.get_record(&new_dir, &name).await.unwrap().unwrap();
    assert_eq!(rehomed.width, Some(1));
    let access = fx.db.get_access(rehomed.id).await.unwrap().unwrap();
    assert!(access.is_active(), "a move must reset the deletion lifecycle");
    assert_eq!(fx.db.count_files().await.unwrap(), 1);
}

#[tokio::test]
async fn stale_cleanup_spares_records_with_deletion_flags() {
    let fx = Fixture::new().await;
    let doomed = fx.write("doomed.txt", b"x");
    let flagged = fx.write("flagged.txt", b"y");

    let reconciler = fx.reconciler();
    reconciler.run_full_pass(&fx.token).await.unwrap();

    let (dir, flagged_name) = split(&flagged);
    let record = fx.db.get_record(&dir, &flagged_name).await.unwrap().unwrap();
    fx.db.set_access_flags(record.id, false, false, true).await.unwrap();

    std::fs::remove_file(&doomed).unwrap();
    std::fs::remove_file(&flagged).unwrap();

    reconciler.run_full_pass(&fx.token).await.unwrap();

    let (_, doomed_name) = split(&doomed);
    assert!(fx.db.get_record(&dir, &doomed_name).await.unwrap().is_none());
    // The flagged record waits for the deletion sweep instead.
    assert!(fx.db.get_record(&dir, &flagged_name).await.unwrap().is_some());
}

#[tokio::test]
async fn unreadable_image_is_deleted_and_not_catalogued() {
    let fx = Fixture::new().await;
    let junk = fx.write("junk.jpg", b"this is not a jpeg");
    fx.write("fine.txt", b"kept");

    fx.reconciler().run_full_pass(&fx.token).await.unwrap();

    assert!(!junk.exists(), "unreadable image should be removed from disk");
    assert_eq!(fx.db.count_files().await.unwrap(), 1);
}

#[tokio::test]
async fn deletion_cycle_defers_to_a_running_full_scan() {
    let fx = Fixture::new().await;
    let target = fx.write("pending.txt", b"still here");
    fx.reconciler().run_full_pass(&fx.token).await.unwrap();

    let (dir, name) = split(&target);
    let record = fx.db.get_record(&dir, &name).await.unwrap().unwrap();
    fx.db.set_access_flags(record.id, true, false, false).await.unwrap();

    let mut config = CuratorConfig::default();
    config.watched_roots = vec![fx.root()];
    let coordinator = RunCoordinator::new();
    let ctx = JobContext {
        db: fx.db.clone(),
        config,
        coordinator: coordinator.clone(),
    };
    let lifecycle = LifecycleEngine::new(fx.db.clone());

    let _guard = coordinator.begin_full_scan();
    jobs::deletion_cycle(&ctx, &lifecycle, &fx.token).await.unwrap();

    // Nothing may change while the gate is held.
    assert!(target.exists());
    let access = fx.db.get_access(record.id).await.unwrap().unwrap();
    assert!(access.soft_delete_pending);
    assert!(!access.soft_deleted);
}

#[tokio::test]
async fn sweep_after_the_gate_clears_finalizes_the_soft_delete() {
    let fx = Fixture::new().await;
    let target = fx.write("pending.txt", b"goes away");
    fx.reconciler().run_full_pass(&fx.token).await.unwrap();

    let (dir, name) = split(&target);
    let record = fx.db.get_record(&dir, &name).await.unwrap().unwrap();
    fx.db.set_access_flags(record.id, true, false, false).await.unwrap();

    let lifecycle = LifecycleEngine::new(fx.db.clone());
    lifecycle.sweep_soft_delete_pending(&fx.token).await.unwrap();

    assert!(!target.exists());
    let access = fx.db.get_access(record.id).await.unwrap().unwrap();
    assert!(access.soft_deleted);
}

#[tokio::test]
async fn cancelled_pass_exits_early_without_error() {
    let fx = Fixture::new().await;
    fx.write("a.txt", b"a");
    fx.write("b.txt", b"b");

    let (handle, token) = shutdown::channel();
    handle.shutdown();

    fx.reconciler().run_full_pass(&token).await.unwrap();
    assert_eq!(fx.db.count_files().await.unwrap(), 0);
}

#[tokio::test]
async fn cancellation_mid_ingest_keeps_flushed_progress() {
    let fx = Fixture::new().await;
    for i in 0..100 {
        fx.write(&format!("bulk/file{i:03}.txt"), b"x");
    }
    // Flush after every record so cancellation lands between batches.
    let reconciler = Reconciler::new(fx.db.clone(), vec![fx.root()], 1);

    let (handle, token) = shutdown::channel();
    let db = fx.db.clone();
    let watcher = tokio::spawn(async move {
        loop {
            if db.count_files().await.unwrap() >= 3 {
                handle.shutdown();
                break;
            }
            tokio::task::yield_now().await;
        }
    });

    reconciler.run_full_pass(&token).await.unwrap();
    watcher.await.unwrap();

    let count = fx.db.count_files().await.unwrap();
    assert!(count >= 3, "records built before cancellation must be persisted");
    assert!(count < 100, "the pass must stop well short of the full tree");
}

#[tokio::test]
async fn vanished_file_is_skipped_without_error() {
    let fx = Fixture::new().await;
    let reconciler = fx.reconciler();

    let ghost = FileKey::new(format!("{}/nowhere", fx.root()), "ghost.txt");
    reconciler.ingest_new_files(&[ghost], &fx.token).await.unwrap();

    assert_eq!(fx.db.count_files().await.unwrap(), 0);
}

#[tokio::test]
async fn stale_cleanup_drops_records_with_no_file_anywhere() {
    let fx = Fixture::new().await;
    fx.write("inside.txt", b"inside");

    // A leftover record pointing nowhere on disk.
    fx.db
        .insert_files(&[NewFileRecord {
            directory: "/somewhere/else".to_string(),
            file_name: "foreign.txt".to_string(),
            size: 1,
            width: None,
            height: None,
            is_image: false,
        }])
        .await
        .unwrap();

    fx.reconciler().run_full_pass(&fx.token).await.unwrap();

    assert!(fx
        .db
        .get_record("/somewhere/else", "foreign.txt")
        .await
        .unwrap()
        .is_none());
    assert_eq!(fx.db.count_files().await.unwrap(), 1);
}
