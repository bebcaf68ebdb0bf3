use crate::error::CallmeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use callme_api_structs::delete_reminder::*;
use callme_domain::{Reminder, ID};
use callme_infra::CallmeContext;

fn handle_error(e: UseCaseError) -> CallmeError {
    match e {
        UseCaseError::NotFound(reminder_id) => CallmeError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
    }
}

pub async fn delete_reminder_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<CallmeContext>,
) -> Result<HttpResponse, CallmeError> {
    let usecase = DeleteReminderUseCase {
        reminder_id: path_params.reminder_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(handle_error)
}

/// Deletion is allowed in every status, it is the only mutation a
/// resolved reminder still accepts.
#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteReminder";

    async fn execute(&mut self, ctx: &CallmeContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .reminders
            .delete(&self.reminder_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.reminder_id.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use callme_domain::ReminderStatus;
    use chrono::Utc;

    #[actix_web::test]
    async fn deletes_resolved_reminders() {
        let ctx = CallmeContext::create_inmemory();
        let reminder = Reminder {
            id: Default::default(),
            title: "Renew the passport".into(),
            message: "Bring two photos".into(),
            phone_number: "+14155551234".parse().expect("Valid phone number"),
            trigger_at: Utc::now(),
            timezone: chrono_tz::UTC,
            status: ReminderStatus::Completed,
            created_at: Utc::now(),
        };
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let usecase = DeleteReminderUseCase {
            reminder_id: reminder.id.clone(),
        };
        let deleted = execute(usecase, &ctx).await.unwrap();

        assert_eq!(deleted.id, reminder.id);
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_none());

        // Deleting twice is a not found
        let usecase = DeleteReminderUseCase {
            reminder_id: reminder.id.clone(),
        };
        assert!(execute(usecase, &ctx).await.is_err());
    }
}
