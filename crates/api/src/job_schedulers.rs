use crate::reminder::process_due_reminders::{
    BatchSummary, ProcessDueRemindersUseCase, UseCaseError as ProcessError,
};
use crate::shared::usecase::execute;
use actix_web::{web, HttpResponse};
use callme_api_structs::trigger_reminder_job::APIResponse;
use callme_infra::CallmeContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives the recurring poll loop: every `scheduler_interval_secs` one
/// cycle selects the due reminders and attempts each of them. The loop
/// only ends on an explicit `stop`, never because a cycle errored.
#[derive(Clone)]
pub struct ReminderJobScheduler {
    ctx: CallmeContext,
    running: Arc<AtomicBool>,
    cycle_in_progress: Arc<AtomicBool>,
}

/// What happened to a requested poll cycle.
#[derive(Debug, PartialEq)]
pub enum CycleOutcome {
    Completed(BatchSummary),
    /// The previous cycle is still running. Overlapping cycles are
    /// skipped rather than queued up behind a slow delivery call.
    SkippedCycleInProgress,
    /// Skip-batch policy: the client has no credentials, so due
    /// reminders stay scheduled until it does.
    SkippedClientNotConfigured,
}

impl ReminderJobScheduler {
    pub fn new(ctx: CallmeContext) -> Self {
        Self {
            ctx,
            running: Arc::new(AtomicBool::new(false)),
            cycle_in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Reminder job scheduler is already running");
            return;
        }

        let scheduler = self.clone();
        actix_web::rt::spawn(async move {
            let period = Duration::from_secs(scheduler.ctx.config.scheduler_interval_secs);
            info!(
                "Reminder job scheduler started. Checking every {} seconds.",
                period.as_secs()
            );
            let mut interval = actix_web::rt::time::interval(period);
            loop {
                interval.tick().await;
                if !scheduler.running.load(Ordering::SeqCst) {
                    break;
                }
                scheduler.run_cycle().await;
            }
            info!("Reminder job scheduler stopped.");
        });
    }

    /// Signals the loop to stop after the cycle it may currently be in.
    /// An in-flight delivery call is never force-cancelled, the client
    /// timeout bounds it.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Reminder job scheduler is not running");
            return;
        }
        info!("Stopping reminder job scheduler ...");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs exactly one poll cycle and returns once every due reminder
    /// in it has been attempted. Shared by the timer loop and the
    /// manual trigger endpoint, the guard keeps the two from
    /// overlapping.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self.cycle_in_progress.swap(true, Ordering::SeqCst) {
            warn!("Previous poll cycle still in progress, skipping this one");
            return CycleOutcome::SkippedCycleInProgress;
        }

        let res = execute(ProcessDueRemindersUseCase, &self.ctx).await;
        self.cycle_in_progress.store(false, Ordering::SeqCst);

        match res {
            Ok(summary) => {
                if summary.attempted > 0 {
                    info!(
                        "Poll cycle attempted {} reminder(s): {} completed, {} failed, {} lost to concurrent cycles",
                        summary.attempted, summary.completed, summary.failed, summary.conflicts
                    );
                }
                CycleOutcome::Completed(summary)
            }
            Err(ProcessError::ClientNotConfigured) => {
                error!(
                    "Voice call client is not configured, skipping the whole poll cycle so due reminders stay scheduled"
                );
                CycleOutcome::SkippedClientNotConfigured
            }
        }
    }
}

/// Manually runs one poll cycle, synchronously. Meant for operational
/// verification without waiting for the next tick.
pub async fn trigger_reminder_job_controller(
    scheduler: web::Data<ReminderJobScheduler>,
) -> HttpResponse {
    match scheduler.run_cycle().await {
        CycleOutcome::Completed(summary) => HttpResponse::Ok().json(APIResponse {
            message: "Poll cycle completed".into(),
            attempted: summary.attempted,
            completed: summary.completed,
            failed: summary.failed,
        }),
        CycleOutcome::SkippedCycleInProgress => HttpResponse::Ok().json(APIResponse {
            message: "Skipped: a poll cycle is already in progress".into(),
            attempted: 0,
            completed: 0,
            failed: 0,
        }),
        CycleOutcome::SkippedClientNotConfigured => HttpResponse::Ok().json(APIResponse {
            message: "Skipped: the voice call client is not configured".into(),
            attempted: 0,
            completed: 0,
            failed: 0,
        }),
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/scheduler/trigger",
        web::post().to(trigger_reminder_job_controller),
    );
}
