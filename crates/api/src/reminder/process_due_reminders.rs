use crate::shared::usecase::UseCase;
use callme_domain::{Reminder, ReminderStatus};
use callme_infra::{CallOutcome, CallmeContext, StatusUpdate, VoiceCallRequest};
use tracing::{debug, error, info, warn};

/// Operational summary of one poll cycle. `attempted` counts every
/// reminder driven through a delivery attempt, including the ones that
/// lost the conditional write.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Attempts whose conditional status write lost to a concurrent
    /// worker
    pub conflicts: usize,
}

/// One poll cycle body: select every due reminder, drive each through
/// exactly one delivery attempt and persist the terminal status.
#[derive(Debug)]
pub struct ProcessDueRemindersUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    /// The voice call client has no credentials and the skip-batch
    /// policy is enabled, so the whole cycle was skipped and due
    /// reminders stay scheduled.
    ClientNotConfigured,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ProcessDueRemindersUseCase {
    type Response = BatchSummary;

    type Error = UseCaseError;

    const NAME: &'static str = "ProcessDueReminders";

    async fn execute(&mut self, ctx: &CallmeContext) -> Result<Self::Response, Self::Error> {
        if ctx.config.skip_batch_when_unconfigured && !ctx.call_client.is_configured() {
            return Err(UseCaseError::ClientNotConfigured);
        }

        // One clock read per cycle so every due-ness decision in the
        // batch uses the same boundary.
        let now = ctx.sys.now();
        let due_reminders = ctx.repos.reminders.find_due(now).await;
        if due_reminders.is_empty() {
            debug!("No due reminders found");
            return Ok(BatchSummary::default());
        }

        info!("Found {} due reminder(s) to process", due_reminders.len());

        let mut summary = BatchSummary::default();
        for reminder in &due_reminders {
            summary.attempted += 1;
            match attempt_reminder(reminder, ctx).await {
                Attempt::Completed => summary.completed += 1,
                Attempt::Failed => summary.failed += 1,
                Attempt::LostRace => summary.conflicts += 1,
                // Status write failed, the reminder stays scheduled and
                // the next cycle will pick it up again.
                Attempt::StoreError => {}
            }
        }

        Ok(summary)
    }
}

#[derive(Debug)]
enum Attempt {
    Completed,
    Failed,
    LostRace,
    StoreError,
}

/// Drives one due reminder through a single delivery attempt. The
/// conditional status write arbitrates concurrent workers: the first
/// successful writer wins and the loser's outcome is discarded.
async fn attempt_reminder(reminder: &Reminder, ctx: &CallmeContext) -> Attempt {
    info!(
        "Processing reminder {}: '{}' for {}",
        reminder.id, reminder.title, reminder.phone_number
    );

    let call_request = VoiceCallRequest {
        phone_number: reminder.phone_number.clone(),
        title: reminder.title.clone(),
        message: reminder.message.clone(),
    };
    let outcome = match ctx.call_client.place_call(&call_request).await {
        Ok(outcome) => outcome,
        // A defect in the client is no reason to leave the reminder
        // scheduled: the poll loop would re-select and re-call it
        // forever.
        Err(e) => {
            error!(
                "Unexpected error from the voice call client for reminder {}: {:?}",
                reminder.id, e
            );
            CallOutcome::Rejected {
                reason: format!("Unexpected client error: {}", e),
            }
        }
    };

    let new_status = match &outcome {
        CallOutcome::Delivered { call_id } => {
            info!(
                "Reminder {} completed successfully. Vapi call id: {}",
                reminder.id, call_id
            );
            ReminderStatus::Completed
        }
        CallOutcome::Rejected { reason } => {
            error!("Reminder {} failed: {}", reminder.id, reason);
            ReminderStatus::Failed
        }
        CallOutcome::Unavailable { reason } => {
            // A configuration problem, surfaced apart from the per-call
            // failures
            error!(
                "Voice call client unavailable while processing reminder {}: {}",
                reminder.id, reason
            );
            ReminderStatus::Failed
        }
    };

    match ctx
        .repos
        .reminders
        .update_status(&reminder.id, ReminderStatus::Scheduled, new_status)
        .await
    {
        Ok(StatusUpdate::Updated) => match new_status {
            ReminderStatus::Completed => Attempt::Completed,
            _ => Attempt::Failed,
        },
        Ok(StatusUpdate::Conflict) => {
            warn!(
                "Reminder {} was already resolved by a concurrent cycle",
                reminder.id
            );
            Attempt::LostRace
        }
        Ok(StatusUpdate::NotFound) => {
            warn!("Reminder {} was deleted while being processed", reminder.id);
            Attempt::LostRace
        }
        Err(e) => {
            error!(
                "Failed to persist status for reminder {}: {:?}",
                reminder.id, e
            );
            Attempt::StoreError
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use callme_domain::{PhoneNumber, Reminder, ReminderStatus, ID};
    use callme_infra::{CallmeContext, ISys, IVoiceCallClient};
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct StaticTimeSys;
    impl ISys for StaticTimeSys {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(1613862000, 0).unwrap()
        }
    }

    fn now() -> DateTime<Utc> {
        StaticTimeSys {}.now()
    }

    /// Scriptable stand-in for the Vapi client. Outcomes are consumed
    /// in call order, the fallback applies once the script runs dry.
    struct FakeCallClient {
        configured: bool,
        script: Mutex<VecDeque<anyhow::Result<CallOutcome>>>,
        fallback: CallOutcome,
        calls: Mutex<Vec<PhoneNumber>>,
    }

    impl FakeCallClient {
        fn delivering() -> Self {
            Self {
                configured: true,
                script: Mutex::new(VecDeque::new()),
                fallback: CallOutcome::Delivered {
                    call_id: "call-1".into(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(reason: &str) -> Self {
            Self {
                fallback: CallOutcome::Rejected {
                    reason: reason.into(),
                },
                ..Self::delivering()
            }
        }

        fn unavailable() -> Self {
            Self {
                configured: false,
                fallback: CallOutcome::Unavailable {
                    reason: "Vapi credentials are not configured".into(),
                },
                ..Self::delivering()
            }
        }

        fn scripted(outcomes: Vec<anyhow::Result<CallOutcome>>) -> Self {
            Self {
                script: Mutex::new(outcomes.into_iter().collect()),
                ..Self::delivering()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn called_numbers(&self) -> Vec<PhoneNumber> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl IVoiceCallClient for FakeCallClient {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn place_call(&self, req: &VoiceCallRequest) -> anyhow::Result<CallOutcome> {
            self.calls.lock().unwrap().push(req.phone_number.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(outcome) => outcome,
                None => Ok(self.fallback.clone()),
            }
        }

        async fn health_check(&self) -> bool {
            self.configured
        }
    }

    fn setup(client: Arc<FakeCallClient>) -> CallmeContext {
        let mut ctx = CallmeContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys {});
        ctx.call_client = client;
        ctx
    }

    fn reminder_factory(trigger_at: DateTime<Utc>, phone_number: &str) -> Reminder {
        Reminder {
            id: Default::default(),
            title: "Take your medicine".into(),
            message: "The blue pills in the top drawer".into(),
            phone_number: phone_number.parse().expect("Valid phone number"),
            trigger_at,
            timezone: chrono_tz::UTC,
            status: ReminderStatus::Scheduled,
            created_at: now() - chrono::Duration::hours(1),
        }
    }

    async fn status_of(ctx: &CallmeContext, reminder_id: &ID) -> ReminderStatus {
        ctx.repos
            .reminders
            .find(reminder_id)
            .await
            .expect("To find reminder")
            .status
    }

    #[actix_web::test]
    async fn delivered_call_completes_the_reminder() {
        let client = Arc::new(FakeCallClient::delivering());
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() - chrono::Duration::seconds(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let summary = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Completed);
        assert_eq!(client.call_count(), 1);
    }

    #[actix_web::test]
    async fn future_reminder_is_left_untouched() {
        let client = Arc::new(FakeCallClient::delivering());
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() + chrono::Duration::hours(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let summary = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(summary, BatchSummary::default());
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Scheduled);
        assert_eq!(client.call_count(), 0);
    }

    #[actix_web::test]
    async fn rejected_call_fails_the_reminder() {
        let client = Arc::new(FakeCallClient::rejecting("busy"));
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() - chrono::Duration::minutes(5), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let summary = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Failed);
    }

    #[actix_web::test]
    async fn unconfigured_client_fails_due_reminders_when_policy_is_off() {
        let client = Arc::new(FakeCallClient::unavailable());
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() - chrono::Duration::seconds(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let summary = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Failed);
    }

    #[actix_web::test]
    async fn unconfigured_client_skips_the_batch_when_policy_is_on() {
        let client = Arc::new(FakeCallClient::unavailable());
        let mut ctx = setup(client.clone());
        ctx.config.skip_batch_when_unconfigured = true;
        let reminder = reminder_factory(now() - chrono::Duration::seconds(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let res = execute(ProcessDueRemindersUseCase, &ctx).await;

        assert_eq!(res.unwrap_err(), UseCaseError::ClientNotConfigured);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Scheduled);
        assert_eq!(client.call_count(), 0);
    }

    #[actix_web::test]
    async fn reminders_are_attempted_in_trigger_order() {
        let client = Arc::new(FakeCallClient::delivering());
        let ctx = setup(client.clone());
        let t1 = reminder_factory(now() - chrono::Duration::hours(3), "+14155550001");
        let t2 = reminder_factory(now() - chrono::Duration::hours(2), "+14155550002");
        let t3 = reminder_factory(now() - chrono::Duration::hours(1), "+14155550003");
        // Inserted out of order on purpose
        for reminder in [&t3, &t1, &t2].iter() {
            ctx.repos.reminders.insert(reminder).await.unwrap();
        }

        execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(
            client.called_numbers(),
            vec![
                t1.phone_number.clone(),
                t2.phone_number.clone(),
                t3.phone_number.clone()
            ]
        );
    }

    #[actix_web::test]
    async fn one_broken_attempt_does_not_abort_the_batch() {
        let client = Arc::new(FakeCallClient::scripted(vec![
            Ok(CallOutcome::Delivered {
                call_id: "call-1".into(),
            }),
            Err(anyhow::anyhow!("client panicked on serialization")),
            Ok(CallOutcome::Delivered {
                call_id: "call-2".into(),
            }),
        ]));
        let ctx = setup(client.clone());
        let t1 = reminder_factory(now() - chrono::Duration::hours(3), "+14155550001");
        let t2 = reminder_factory(now() - chrono::Duration::hours(2), "+14155550002");
        let t3 = reminder_factory(now() - chrono::Duration::hours(1), "+14155550003");
        for reminder in [&t1, &t2, &t3].iter() {
            ctx.repos.reminders.insert(reminder).await.unwrap();
        }

        let summary = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(status_of(&ctx, &t1.id).await, ReminderStatus::Completed);
        // The broken attempt still resolves to a terminal status
        assert_eq!(status_of(&ctx, &t2.id).await, ReminderStatus::Failed);
        assert_eq!(status_of(&ctx, &t3.id).await, ReminderStatus::Completed);
    }

    #[actix_web::test]
    async fn second_cycle_does_not_reconsider_resolved_reminders() {
        let client = Arc::new(FakeCallClient::delivering());
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() - chrono::Duration::seconds(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let first = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();
        let second = execute(ProcessDueRemindersUseCase, &ctx).await.unwrap();

        assert_eq!(first.completed, 1);
        assert_eq!(second.attempted, 0);
        assert_eq!(client.call_count(), 1);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Completed);
    }

    #[actix_web::test]
    async fn racing_attempts_persist_exactly_one_terminal_status() {
        let client = Arc::new(FakeCallClient::scripted(vec![
            Ok(CallOutcome::Delivered {
                call_id: "call-1".into(),
            }),
            Ok(CallOutcome::Rejected {
                reason: "busy".into(),
            }),
        ]));
        let ctx = setup(client.clone());
        let reminder = reminder_factory(now() - chrono::Duration::seconds(1), "+14155551234");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        // Two workers both selected the reminder before either resolved
        // it. Both place a call, only the first write wins.
        let first = attempt_reminder(&reminder, &ctx).await;
        let second = attempt_reminder(&reminder, &ctx).await;

        assert!(matches!(first, Attempt::Completed));
        assert!(matches!(second, Attempt::LostRace));
        assert_eq!(client.call_count(), 2);
        assert_eq!(status_of(&ctx, &reminder.id).await, ReminderStatus::Completed);
    }
}
