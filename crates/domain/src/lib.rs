mod phone_number;
mod reminder;
mod shared;

pub use phone_number::{InvalidPhoneNumberError, PhoneNumber};
pub use reminder::{Reminder, ReminderStatus, MESSAGE_MAX_LEN, TITLE_MAX_LEN};
pub use shared::entity::{Entity, ID};
