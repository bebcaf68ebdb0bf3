use super::{IReminderRepo, StatusUpdate};
use crate::repos::shared::inmemory_repo::*;
use crate::repos::shared::query_structs::ReminderFindQuery;
use callme_domain::{Reminder, ReminderStatus, ID};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        let mut reminders = self.reminders.lock().unwrap();
        for stored in reminders.iter_mut() {
            if stored.id == reminder.id {
                // A terminal status stands, even if an edit raced the
                // poll cycle.
                if stored.status == ReminderStatus::Scheduled {
                    stored.title = reminder.title.clone();
                    stored.message = reminder.message.clone();
                    stored.phone_number = reminder.phone_number.clone();
                    stored.trigger_at = reminder.trigger_at;
                    stored.timezone = reminder.timezone;
                }
                break;
            }
        }
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut due = find_by(&self.reminders, |r: &Reminder| r.is_due(now));
        due.sort_by(|r1, r2| {
            r1.trigger_at
                .cmp(&r2.trigger_at)
                .then_with(|| r1.id.cmp(&r2.id))
        });
        due
    }

    async fn find_by_query(
        &self,
        query: ReminderFindQuery,
    ) -> anyhow::Result<(Vec<Reminder>, usize)> {
        let search = query.search.as_ref().map(|s| s.to_lowercase());
        let mut matches = find_by(&self.reminders, |r: &Reminder| {
            let status_matches = match query.status {
                Some(status) => r.status == status,
                None => true,
            };
            let search_matches = match &search {
                Some(term) => r.title.to_lowercase().contains(term),
                None => true,
            };
            status_matches && search_matches
        });
        matches.sort_by(|r1, r2| {
            r1.trigger_at
                .cmp(&r2.trigger_at)
                .then_with(|| r1.id.cmp(&r2.id))
        });
        let total = matches.len();
        let reminders = matches
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .collect();
        Ok((reminders, total))
    }

    async fn update_status(
        &self,
        reminder_id: &ID,
        expected: ReminderStatus,
        new_status: ReminderStatus,
    ) -> anyhow::Result<StatusUpdate> {
        // Check and write under a single lock acquisition: this is the
        // one mutation contention point of the whole engine.
        let mut reminders = self.reminders.lock().unwrap();
        for stored in reminders.iter_mut() {
            if stored.id == *reminder_id {
                if stored.status != expected {
                    return Ok(StatusUpdate::Conflict);
                }
                stored.status = new_status;
                return Ok(StatusUpdate::Updated);
            }
        }
        Ok(StatusUpdate::NotFound)
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        delete(reminder_id, &self.reminders)
    }
}
