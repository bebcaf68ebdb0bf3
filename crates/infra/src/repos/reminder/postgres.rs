use super::{IReminderRepo, StatusUpdate};
use crate::repos::shared::query_structs::ReminderFindQuery;
use callme_domain::{PhoneNumber, Reminder, ReminderStatus, ID};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::{FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;
use uuid::Uuid;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    title: String,
    message: String,
    phone_number: String,
    trigger_at: DateTime<Utc>,
    timezone: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> Result<Self, Self::Error> {
        let timezone = raw
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone stored for reminder: {}", e))?;
        Ok(Self {
            id: raw.reminder_uid.into(),
            title: raw.title,
            message: raw.message,
            phone_number: raw.phone_number.parse::<PhoneNumber>()?,
            trigger_at: raw.trigger_at,
            timezone,
            status: raw.status.parse::<ReminderStatus>()?,
            created_at: raw.created_at,
        })
    }
}

fn into_reminders(raw_reminders: Vec<ReminderRaw>) -> Vec<Reminder> {
    raw_reminders
        .into_iter()
        .filter_map(|raw| match Reminder::try_from(raw) {
            Ok(reminder) => Some(reminder),
            Err(e) => {
                error!("Unable to read stored reminder: {:?}", e);
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, title, message, phone_number, trigger_at, timezone, status, created_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.title)
        .bind(&reminder.message)
        .bind(reminder.phone_number.as_str())
        .bind(reminder.trigger_at)
        .bind(reminder.timezone.name())
        .bind(reminder.status.as_str())
        .bind(reminder.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        // Content only, and only while the row is still scheduled. The
        // status column is owned by `update_status`.
        sqlx::query(
            r#"
            UPDATE reminders SET
            title = $1,
            message = $2,
            phone_number = $3,
            trigger_at = $4,
            timezone = $5
            WHERE reminder_uid = $6 AND status = $7
            "#,
        )
        .bind(&reminder.title)
        .bind(&reminder.message)
        .bind(reminder.phone_number.as_str())
        .bind(reminder.trigger_at)
        .bind(reminder.timezone.name())
        .bind(reminder.id.inner_ref())
        .bind(ReminderStatus::Scheduled.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Find reminder {} failed: {:?}", reminder_id, e);
            None
        })?;
        into_reminders(vec![raw]).into_iter().next()
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let raw_reminders = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders
            WHERE status = $1 AND trigger_at <= $2
            ORDER BY trigger_at ASC, reminder_uid ASC
            "#,
        )
        .bind(ReminderStatus::Scheduled.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Find due reminders failed: {:?}", e);
            Vec::new()
        });
        into_reminders(raw_reminders)
    }

    async fn find_by_query(
        &self,
        query: ReminderFindQuery,
    ) -> anyhow::Result<(Vec<Reminder>, usize)> {
        let status = query.status.map(|s| s.as_str().to_string());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reminders
            WHERE ($1::text IS NULL OR status = $1)
            AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(&status)
        .bind(&query.search)
        .fetch_one(&self.pool)
        .await?;

        let raw_reminders = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders
            WHERE ($1::text IS NULL OR status = $1)
            AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%')
            ORDER BY trigger_at ASC, reminder_uid ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&status)
        .bind(&query.search)
        .bind(query.limit as i64)
        .bind(query.skip as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((into_reminders(raw_reminders), total as usize))
    }

    async fn update_status(
        &self,
        reminder_id: &ID,
        expected: ReminderStatus,
        new_status: ReminderStatus,
    ) -> anyhow::Result<StatusUpdate> {
        let res = sqlx::query(
            r#"
            UPDATE reminders SET status = $1
            WHERE reminder_uid = $2 AND status = $3
            "#,
        )
        .bind(new_status.as_str())
        .bind(reminder_id.inner_ref())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if res.rows_affected() > 0 {
            return Ok(StatusUpdate::Updated);
        }

        let current = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status FROM reminders
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        match current {
            Some(_) => Ok(StatusUpdate::Conflict),
            None => Ok(StatusUpdate::NotFound),
        }
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            r#"
            DELETE FROM reminders
            WHERE reminder_uid = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Delete reminder {} failed: {:?}", reminder_id, e);
            None
        })?;
        into_reminders(vec![raw]).into_iter().next()
    }
}
