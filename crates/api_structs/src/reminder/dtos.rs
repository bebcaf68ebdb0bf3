use callme_domain::{PhoneNumber, Reminder, ReminderStatus, ID};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub title: String,
    pub message: String,
    pub phone_number: PhoneNumber,
    pub trigger_at: DateTime<Utc>,
    pub timezone: Tz,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id.clone(),
            title: reminder.title,
            message: reminder.message,
            phone_number: reminder.phone_number,
            trigger_at: reminder.trigger_at,
            timezone: reminder.timezone,
            status: reminder.status,
            created_at: reminder.created_at,
        }
    }
}
