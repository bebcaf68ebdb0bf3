mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;

use crate::repos::shared::query_structs::ReminderFindQuery;
use callme_domain::{Reminder, ReminderStatus, ID};
use chrono::{DateTime, Utc};

/// Outcome of the conditional status write. `Conflict` means the row no
/// longer held the expected status at write time, so another worker
/// already resolved the reminder and its status stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated,
    Conflict,
    NotFound,
}

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// Persists content edits (title, message, phone number, trigger
    /// time, timezone) of a reminder that is still scheduled. Never
    /// touches `status`, and applies nothing if the stored reminder has
    /// already reached a terminal status.
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// All reminders with status `scheduled` and `trigger_at <= now`,
    /// ordered ascending by trigger time, ties broken by id. Read-only.
    async fn find_due(&self, now: DateTime<Utc>) -> Vec<Reminder>;
    async fn find_by_query(&self, query: ReminderFindQuery)
        -> anyhow::Result<(Vec<Reminder>, usize)>;
    /// Conditional write arbitrating concurrent workers: the status is
    /// only set when the stored status still equals `expected`.
    async fn update_status(
        &self,
        reminder_id: &ID,
        expected: ReminderStatus,
        new_status: ReminderStatus,
    ) -> anyhow::Result<StatusUpdate>;
    async fn delete(&self, reminder_id: &ID) -> Option<Reminder>;
}
