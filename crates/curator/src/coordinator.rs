//! Advisory coordination between the job loops.
//!
//! The full reconciliation pass and the deletion/rename runs share the
//! catalog. The flag here is advisory: sweeps check it at cycle start and
//! skip the cycle while a full scan is underway, rather than blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunCoordinator {
    full_scan: Arc<AtomicBool>,
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a full reconciliation pass holds its guard.
    pub fn full_scan_in_progress(&self) -> bool {
        self.full_scan.load(Ordering::SeqCst)
    }

    /// Mark a full scan as running. The flag clears when the guard drops,
    /// including on panic or early return.
    pub fn begin_full_scan(&self) -> FullScanGuard {
        self.full_scan.store(true, Ordering::SeqCst);
        FullScanGuard {
            flag: Arc::clone(&self.full_scan),
        }
    }
}

pub struct FullScanGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for FullScanGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sets_and_clears_the_flag() {
        let coordinator = RunCoordinator::new();
        assert!(!coordinator.full_scan_in_progress());

        {
            let _guard = coordinator.begin_full_scan();
            assert!(coordinator.full_scan_in_progress());
        }

        assert!(!coordinator.full_scan_in_progress());
    }

    #[test]
    fn clones_share_the_flag() {
        let coordinator = RunCoordinator::new();
        let observer = coordinator.clone();

        let _guard = coordinator.begin_full_scan();
        assert!(observer.full_scan_in_progress());
    }
}
