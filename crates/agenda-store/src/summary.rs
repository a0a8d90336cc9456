//! Aggregate counters for the dashboard widgets.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use agenda_shared::{DisplayStatus, Record};

/// Counts over the cached collection at a given instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Records starting on the same calendar day as `now`, in `now`'s zone.
    pub today: usize,
    pub flagged: usize,
    pub scheduled: usize,
    pub ongoing: usize,
    pub ended: usize,
}

impl Summary {
    pub fn compute<Tz: TimeZone>(records: &[Record], now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);

        records.iter().fold(Summary::default(), |mut acc, record| {
            acc.total += 1;
            if record.start_at.with_timezone(&tz).date_naive() == today {
                acc.today += 1;
            }
            if record.flagged {
                acc.flagged += 1;
            }
            match record.status_at(now_utc) {
                DisplayStatus::Scheduled => acc.scheduled += 1,
                DisplayStatus::Ongoing => acc.ongoing += 1,
                DisplayStatus::Ended => acc.ended += 1,
            }
            acc
        })
    }
}
