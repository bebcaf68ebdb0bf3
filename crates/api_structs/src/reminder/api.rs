use crate::dtos::ReminderDTO;
use callme_domain::{Reminder, ReminderStatus, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub reminder: ReminderDTO,
}

impl ReminderResponse {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            reminder: ReminderDTO::new(reminder),
        }
    }
}

pub mod create_reminder {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub title: String,
        pub message: String,
        pub phone_number: String,
        /// UTC instant at which the call should be placed
        pub trigger_at: DateTime<Utc>,
        /// IANA timezone identifier the reminder was entered in
        pub timezone: String,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod get_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod get_reminders {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        /// 1-based page number, defaults to 1
        pub page: Option<usize>,
        /// Defaults to 10, max 100
        pub per_page: Option<usize>,
        pub status: Option<ReminderStatus>,
        /// Case-insensitive title substring
        pub search: Option<String>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub reminders: Vec<ReminderDTO>,
        pub total: usize,
        pub page: usize,
        pub per_page: usize,
    }

    impl APIResponse {
        pub fn new(reminders: Vec<Reminder>, total: usize, page: usize, per_page: usize) -> Self {
            Self {
                reminders: reminders.into_iter().map(ReminderDTO::new).collect(),
                total,
                page,
                per_page,
            }
        }
    }
}

pub mod update_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub title: Option<String>,
        pub message: Option<String>,
        pub phone_number: Option<String>,
        pub trigger_at: Option<DateTime<Utc>>,
        pub timezone: Option<String>,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod delete_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type APIResponse = ReminderResponse;
}
