use crate::error::CallmeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use callme_api_structs::create_reminder::*;
use callme_domain::{PhoneNumber, Reminder, ReminderStatus, MESSAGE_MAX_LEN, TITLE_MAX_LEN};
use callme_infra::CallmeContext;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub async fn create_reminder_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CallmeContext>,
) -> Result<HttpResponse, CallmeError> {
    let body = body.0;
    let usecase = CreateReminderUseCase {
        title: body.title,
        message: body.message,
        phone_number: body.phone_number,
        trigger_at: body.trigger_at,
        timezone: body.timezone,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Created().json(APIResponse::new(reminder)))
        .map_err(CallmeError::from)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub title: String,
    pub message: String,
    pub phone_number: String,
    pub trigger_at: DateTime<Utc>,
    pub timezone: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidTitle,
    InvalidMessage,
    InvalidPhoneNumber(String),
    InvalidTimezone(String),
    StorageError,
}

impl From<UseCaseError> for CallmeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidTitle => Self::BadClientData(format!(
                "The title must be between 1 and {} characters long",
                TITLE_MAX_LEN
            )),
            UseCaseError::InvalidMessage => Self::BadClientData(format!(
                "The message must be between 1 and {} characters long",
                MESSAGE_MAX_LEN
            )),
            UseCaseError::InvalidPhoneNumber(phone_number) => Self::BadClientData(format!(
                "The phone number: {}, is not in E.164 format (e.g. +14155551234)",
                phone_number
            )),
            UseCaseError::InvalidTimezone(timezone) => Self::BadClientData(format!(
                "The timezone: {}, is not a valid IANA timezone identifier",
                timezone
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

pub fn validate_title(title: &str) -> bool {
    !title.trim().is_empty() && title.len() <= TITLE_MAX_LEN
}

pub fn validate_message(message: &str) -> bool {
    !message.trim().is_empty() && message.len() <= MESSAGE_MAX_LEN
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &CallmeContext) -> Result<Self::Response, Self::Error> {
        if !validate_title(&self.title) {
            return Err(UseCaseError::InvalidTitle);
        }
        if !validate_message(&self.message) {
            return Err(UseCaseError::InvalidMessage);
        }
        let phone_number = self
            .phone_number
            .parse::<PhoneNumber>()
            .map_err(|_| UseCaseError::InvalidPhoneNumber(self.phone_number.clone()))?;
        let timezone = self
            .timezone
            .parse::<Tz>()
            .map_err(|_| UseCaseError::InvalidTimezone(self.timezone.clone()))?;

        let reminder = Reminder {
            id: Default::default(),
            title: self.title.clone(),
            message: self.message.clone(),
            phone_number,
            trigger_at: self.trigger_at,
            timezone,
            status: ReminderStatus::Scheduled,
            created_at: ctx.sys.now(),
        };

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(reminder)
    }
}
