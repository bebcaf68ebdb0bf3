use super::create_reminder::{validate_message, validate_title};
use crate::error::CallmeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use callme_api_structs::update_reminder::*;
use callme_domain::{PhoneNumber, Reminder, ID};
use callme_infra::CallmeContext;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

fn handle_error(e: UseCaseError) -> CallmeError {
    match e {
        UseCaseError::NotFound(reminder_id) => CallmeError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
        UseCaseError::NotEditable(reminder_id) => CallmeError::Conflict(format!(
            "The reminder with id: {}, has already been resolved and can no longer be edited.",
            reminder_id
        )),
        UseCaseError::InvalidTitle => {
            CallmeError::BadClientData("Invalid title specified for the reminder".into())
        }
        UseCaseError::InvalidMessage => {
            CallmeError::BadClientData("Invalid message specified for the reminder".into())
        }
        UseCaseError::InvalidPhoneNumber(phone_number) => CallmeError::BadClientData(format!(
            "The phone number: {}, is not in E.164 format (e.g. +14155551234)",
            phone_number
        )),
        UseCaseError::InvalidTimezone(timezone) => CallmeError::BadClientData(format!(
            "The timezone: {}, is not a valid IANA timezone identifier",
            timezone
        )),
        UseCaseError::StorageError => CallmeError::InternalError,
    }
}

pub async fn update_reminder_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<CallmeContext>,
) -> Result<HttpResponse, CallmeError> {
    let body = body.0;
    let usecase = UpdateReminderUseCase {
        reminder_id: path_params.reminder_id.clone(),
        title: body.title,
        message: body.message,
        phone_number: body.phone_number,
        trigger_at: body.trigger_at,
        timezone: body.timezone,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(handle_error)
}

/// Partial update of a reminder that is still scheduled. Fields that
/// are `None` keep their stored value.
#[derive(Debug)]
pub struct UpdateReminderUseCase {
    pub reminder_id: ID,
    pub title: Option<String>,
    pub message: Option<String>,
    pub phone_number: Option<String>,
    pub trigger_at: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    /// Terminal reminders are immutable except for deletion
    NotEditable(ID),
    InvalidTitle,
    InvalidMessage,
    InvalidPhoneNumber(String),
    InvalidTimezone(String),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateReminder";

    async fn execute(&mut self, ctx: &CallmeContext) -> Result<Self::Response, Self::Error> {
        let mut reminder = ctx
            .repos
            .reminders
            .find(&self.reminder_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.reminder_id.clone()))?;

        if !reminder.is_editable() {
            return Err(UseCaseError::NotEditable(self.reminder_id.clone()));
        }

        if let Some(title) = &self.title {
            if !validate_title(title) {
                return Err(UseCaseError::InvalidTitle);
            }
            reminder.title = title.clone();
        }
        if let Some(message) = &self.message {
            if !validate_message(message) {
                return Err(UseCaseError::InvalidMessage);
            }
            reminder.message = message.clone();
        }
        if let Some(phone_number) = &self.phone_number {
            reminder.phone_number = phone_number
                .parse::<PhoneNumber>()
                .map_err(|_| UseCaseError::InvalidPhoneNumber(phone_number.clone()))?;
        }
        if let Some(trigger_at) = self.trigger_at {
            reminder.trigger_at = trigger_at;
        }
        if let Some(timezone) = &self.timezone {
            reminder.timezone = timezone
                .parse::<Tz>()
                .map_err(|_| UseCaseError::InvalidTimezone(timezone.clone()))?;
        }

        ctx.repos
            .reminders
            .save(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(reminder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use callme_domain::ReminderStatus;
    use chrono::Duration;

    fn reminder_factory(status: ReminderStatus) -> Reminder {
        Reminder {
            id: Default::default(),
            title: "Pick up the kids".into(),
            message: "School closes early today".into(),
            phone_number: "+14155551234".parse().expect("Valid phone number"),
            trigger_at: Utc::now() + Duration::hours(1),
            timezone: chrono_tz::UTC,
            status,
            created_at: Utc::now(),
        }
    }

    fn usecase_factory(reminder: &Reminder) -> UpdateReminderUseCase {
        UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            title: Some("Pick up the kids at noon".into()),
            message: None,
            phone_number: None,
            trigger_at: Some(reminder.trigger_at + Duration::minutes(30)),
            timezone: None,
        }
    }

    #[actix_web::test]
    async fn updates_scheduled_reminder() {
        let ctx = CallmeContext::create_inmemory();
        let reminder = reminder_factory(ReminderStatus::Scheduled);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let updated = execute(usecase_factory(&reminder), &ctx).await.unwrap();

        assert_eq!(updated.title, "Pick up the kids at noon");
        assert_eq!(updated.trigger_at, reminder.trigger_at + Duration::minutes(30));
        // Untouched fields keep their stored values
        assert_eq!(updated.message, reminder.message);

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(stored.title, "Pick up the kids at noon");
    }

    #[actix_web::test]
    async fn refuses_to_update_resolved_reminders() {
        let ctx = CallmeContext::create_inmemory();
        for status in [ReminderStatus::Completed, ReminderStatus::Failed].iter() {
            let reminder = reminder_factory(*status);
            ctx.repos.reminders.insert(&reminder).await.unwrap();

            assert_eq!(
                execute(usecase_factory(&reminder), &ctx).await.unwrap_err(),
                UseCaseError::NotEditable(reminder.id.clone())
            );
        }
    }

    #[actix_web::test]
    async fn unknown_reminder_is_not_found() {
        let ctx = CallmeContext::create_inmemory();
        let reminder = reminder_factory(ReminderStatus::Scheduled);

        assert_eq!(
            execute(usecase_factory(&reminder), &ctx).await.unwrap_err(),
            UseCaseError::NotFound(reminder.id)
        );
    }
}
