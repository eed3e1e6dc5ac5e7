use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::routine::Routine;

/// Hour of day (UTC) at which routine reminders fire.
pub const REMINDER_HOUR: u32 = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRequest {
    pub routine_id: String,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

impl ReminderRequest {
    /// Reminder for `routine` on `day`, or `None` when the hour cannot be
    /// represented for that date.
    pub fn for_routine(routine: &Routine, day: NaiveDate) -> Option<Self> {
        let naive = day.and_hms_opt(REMINDER_HOUR, 0, 0)?;
        Some(Self {
            routine_id: routine.id.clone(),
            title: format!("Routine: {}", routine.title),
            body: routine.summary(),
            scheduled_for: Utc.from_utc_datetime(&naive),
        })
    }
}

/// Platform-specific notification adapters will implement this trait.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
    fn clear_for_routine(&self, routine: &Routine);
}
