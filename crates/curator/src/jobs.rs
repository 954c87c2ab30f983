//! The three long-running job loops.
//!
//! Each loop owns a shutdown token and exits promptly when it flips. A
//! failed cycle is logged and swallowed; the loop lives on and tries again
//! at its next slot.

use crate::config::CuratorConfig;
use crate::coordinator::RunCoordinator;
use crate::error::{CuratorError, Disposition, Result};
use crate::lifecycle::LifecycleEngine;
use crate::reconcile::Reconciler;
use crate::rename::RenamePropagator;
use crate::schedule;
use crate::shutdown::ShutdownToken;
use crate::MetadataApi;
use chrono::NaiveTime;
use curator_db::CuratorDb;
use std::time::Duration;
use tracing::{error, info, warn};

/// Everything a job loop needs. Cheap to clone, one per spawned job.
#[derive(Clone)]
pub struct JobContext {
    pub db: CuratorDb,
    pub config: CuratorConfig,
    pub coordinator: RunCoordinator,
}

/// Log a failed cycle at the level its disposition calls for; the loop
/// always survives to its next slot.
fn log_cycle_failure(job: &str, err: &CuratorError) {
    match err.disposition() {
        Disposition::Fail => error!(job, error = %err, "Cycle failed"),
        _ => warn!(job, error = %err, "Cycle ended early"),
    }
}

/// Daily full reconciliation.
///
/// Runs a pass immediately on startup, then sleeps until the configured
/// time each day. The coordinator guard is held for the duration of each
/// pass so the other jobs stand aside.
pub async fn run_full_scan_job(ctx: JobContext, at: NaiveTime, mut shutdown: ShutdownToken) {
    info!(%at, "Full-scan job started");
    let reconciler = Reconciler::new(
        ctx.db.clone(),
        ctx.config.watched_roots.clone(),
        ctx.config.batch_size,
    );

    loop {
        {
            let _guard = ctx.coordinator.begin_full_scan();
            if let Err(err) = reconciler.run_full_pass(&shutdown).await {
                log_cycle_failure("full-scan", &err);
            }
        }

        if shutdown.is_cancelled() {
            break;
        }

        let delay = schedule::delay_until_local(at);
        info!(secs = delay.as_secs(), "Waiting until next full reconciliation");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => break,
        }
    }
    info!("Full-scan job stopped");
}

/// Hourly deletion sweeps, with the monthly re-assertion when due.
pub async fn run_deletion_job(ctx: JobContext, mut shutdown: ShutdownToken) {
    info!(
        interval_secs = ctx.config.sweep_interval_secs,
        "Deletion job started"
    );
    let lifecycle = LifecycleEngine::new(ctx.db.clone());
    let interval = Duration::from_secs(ctx.config.sweep_interval_secs);

    loop {
        if let Err(err) = deletion_cycle(&ctx, &lifecycle, &shutdown).await {
            log_cycle_failure("deletion", &err);
        }

        if shutdown.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => break,
        }
    }
    info!("Deletion job stopped");
}

/// One deletion cycle: skip entirely while a full scan runs, otherwise the
/// monthly re-assertion if due, then hard deletes, then soft deletes.
pub async fn deletion_cycle(
    ctx: &JobContext,
    lifecycle: &LifecycleEngine,
    shutdown: &ShutdownToken,
) -> Result<()> {
    if ctx.coordinator.full_scan_in_progress() {
        info!("Full reconciliation in progress; skipping deletion sweeps this cycle");
        return Ok(());
    }

    if schedule::resweep_due_local(ctx.config.resweep_day_of_month, ctx.config.resweep_hour) {
        lifecycle.sweep_previously_soft_deleted(shutdown).await?;
    }

    lifecycle.sweep_hard_delete_pending(shutdown).await?;
    lifecycle.sweep_soft_delete_pending(shutdown).await?;
    Ok(())
}

/// Daily rename propagation at the configured time.
///
/// Unlike the full scan this job sleeps first: renames only make sense once
/// an operator has configured rules, there is nothing to do at startup.
pub async fn run_rename_job<A: MetadataApi>(
    ctx: JobContext,
    api: A,
    at: NaiveTime,
    mut shutdown: ShutdownToken,
) {
    info!(%at, "Rename job started");
    let propagator = RenamePropagator::new(ctx.db.clone(), api);

    loop {
        let delay = schedule::delay_until_local(at);
        info!(secs = delay.as_secs(), "Waiting until next rename propagation");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => break,
        }

        if ctx.coordinator.full_scan_in_progress() {
            info!("Full reconciliation in progress; skipping rename propagation");
            continue;
        }

        match propagator
            .apply_renames(&ctx.config.rename_rules, &shutdown)
            .await
        {
            Ok(pushed) => info!(pushed, "Rename propagation complete"),
            Err(err) => log_cycle_failure("rename", &err),
        }
    }
    info!("Rename job stopped");
}
