//! Time-derived display status of a record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where "now" falls relative to a record's `[start_at, end_at)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    /// `now < start_at`
    Scheduled,
    /// `start_at <= now < end_at`
    Ongoing,
    /// `now >= end_at`
    Ended,
}

impl DisplayStatus {
    /// Classify `now` against a closed-open interval.  A record is ongoing at
    /// exactly `start_at` and ended at exactly `end_at`.
    pub fn of(start_at: DateTime<Utc>, end_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start_at {
            DisplayStatus::Scheduled
        } else if now < end_at {
            DisplayStatus::Ongoing
        } else {
            DisplayStatus::Ended
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Scheduled => "scheduled",
            DisplayStatus::Ongoing => "ongoing",
            DisplayStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        (start, start + Duration::hours(1))
    }

    #[test]
    fn test_before_start_is_scheduled() {
        let (start, end) = window();
        let now = start - Duration::seconds(1);
        assert_eq!(DisplayStatus::of(start, end, now), DisplayStatus::Scheduled);
    }

    #[test]
    fn test_boundaries_are_closed_open() {
        let (start, end) = window();
        assert_eq!(DisplayStatus::of(start, end, start), DisplayStatus::Ongoing);
        assert_eq!(
            DisplayStatus::of(start, end, end - Duration::seconds(1)),
            DisplayStatus::Ongoing
        );
        assert_eq!(DisplayStatus::of(start, end, end), DisplayStatus::Ended);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DisplayStatus::Ongoing).unwrap();
        assert_eq!(json, "\"ongoing\"");
    }
}
