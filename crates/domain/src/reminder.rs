use crate::phone_number::PhoneNumber;
use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const TITLE_MAX_LEN: usize = 255;
pub const MESSAGE_MAX_LEN: usize = 1000;

/// A `Reminder` schedules exactly one outbound voice call to
/// `phone_number` at the UTC instant `trigger_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    pub title: String,
    /// What the voice assistant should say to the recipient
    pub message: String,
    pub phone_number: PhoneNumber,
    /// The UTC instant at which the call should be placed. Conversion
    /// from the local wall time the user entered happens before the
    /// reminder is stored.
    pub trigger_at: DateTime<Utc>,
    /// The IANA timezone the reminder was entered in. Retained for
    /// display, never consulted for due-ness.
    pub timezone: Tz,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Scheduled && self.trigger_at <= now
    }

    /// Content edits are only allowed before a delivery attempt has
    /// resolved the reminder.
    pub fn is_editable(&self) -> bool {
        self.status == ReminderStatus::Scheduled
    }
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Lifecycle status of a `Reminder`. Transitions only ever go from
/// `Scheduled` to one of the two terminal statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Completed,
    Failed,
}

impl ReminderStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            ReminderStatus::Scheduled => false,
            ReminderStatus::Completed | ReminderStatus::Failed => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Scheduled => "scheduled",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Failed => "failed",
        }
    }
}

impl Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InvalidReminderStatusError {
    #[error("Reminder status: {0} is not recognized")]
    Malformed(String),
}

impl FromStr for ReminderStatus {
    type Err = InvalidReminderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ReminderStatus::Scheduled),
            "completed" => Ok(ReminderStatus::Completed),
            "failed" => Ok(ReminderStatus::Failed),
            _ => Err(InvalidReminderStatusError::Malformed(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn reminder_factory(trigger_at: DateTime<Utc>, status: ReminderStatus) -> Reminder {
        Reminder {
            id: Default::default(),
            title: "Take your medicine".into(),
            message: "Remember the blue pills in the top drawer".into(),
            phone_number: "+14155551234".parse().expect("Valid phone number"),
            trigger_at,
            timezone: chrono_tz::America::New_York,
            status,
            created_at: Utc.timestamp_opt(1613862000, 0).unwrap(),
        }
    }

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            ReminderStatus::Scheduled,
            ReminderStatus::Completed,
            ReminderStatus::Failed,
        ]
        .iter()
        {
            assert_eq!(status.as_str().parse::<ReminderStatus>().unwrap(), *status);
        }
        assert!("pending".parse::<ReminderStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ReminderStatus::Scheduled.is_terminal());
        assert!(ReminderStatus::Completed.is_terminal());
        assert!(ReminderStatus::Failed.is_terminal());
    }

    #[test]
    fn due_when_scheduled_and_trigger_passed() {
        let now = Utc.timestamp_opt(1613862000, 0).unwrap();

        let reminder = reminder_factory(now - chrono::Duration::seconds(1), ReminderStatus::Scheduled);
        assert!(reminder.is_due(now));

        let reminder = reminder_factory(now, ReminderStatus::Scheduled);
        assert!(reminder.is_due(now));

        let reminder = reminder_factory(now + chrono::Duration::hours(1), ReminderStatus::Scheduled);
        assert!(!reminder.is_due(now));

        let reminder = reminder_factory(now - chrono::Duration::hours(1), ReminderStatus::Failed);
        assert!(!reminder.is_due(now));
    }

    #[test]
    fn only_scheduled_reminders_are_editable() {
        let now = Utc.timestamp_opt(1613862000, 0).unwrap();
        assert!(reminder_factory(now, ReminderStatus::Scheduled).is_editable());
        assert!(!reminder_factory(now, ReminderStatus::Completed).is_editable());
        assert!(!reminder_factory(now, ReminderStatus::Failed).is_editable());
    }
}
