use callme_domain::ReminderStatus;

/// Paging query for listing reminders, ordered ascending by trigger
/// time.
#[derive(Debug, Clone, Default)]
pub struct ReminderFindQuery {
    pub status: Option<ReminderStatus>,
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub skip: usize,
    pub limit: usize,
}
