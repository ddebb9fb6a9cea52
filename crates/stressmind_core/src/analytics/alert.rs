//! Parental check-in alert.
//!
//! This is a heuristic screen over the last few journal entries. It is not a
//! diagnostic signal and must not be presented as one: it only suggests that
//! a trusted adult check in.

use crate::model::mood::MoodEntry;
use chrono::{DateTime, Utc};

const RECENT_WINDOW: usize = 5;
const NEGATIVE_THRESHOLD: usize = 4;
const CHECK_IN_MESSAGE: &str =
    "Your teen has logged several difficult moods recently. Consider checking in with them.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertReason {
    MultipleNegativeMoods,
}

impl AlertReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::MultipleNegativeMoods => "multiple-negative-moods",
        }
    }
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyAlert {
    pub triggered_at: DateTime<Utc>,
    pub reason: AlertReason,
    pub message: String,
}

pub fn check_emergency_trigger(
    entries: &[MoodEntry],
    sharing_enabled: bool,
) -> Option<EmergencyAlert> {
    check_emergency_trigger_at(entries, sharing_enabled, Utc::now())
}

/// Returns an alert when at least 4 of the 5 most recent entries are
/// negative moods and parental sharing is enabled.
///
/// `entries` must be newest-first.
pub fn check_emergency_trigger_at(
    entries: &[MoodEntry],
    sharing_enabled: bool,
    now: DateTime<Utc>,
) -> Option<EmergencyAlert> {
    if !sharing_enabled {
        return None;
    }

    let negative = entries
        .iter()
        .take(RECENT_WINDOW)
        .filter(|entry| entry.mood.is_negative())
        .count();
    if negative < NEGATIVE_THRESHOLD {
        return None;
    }

    Some(EmergencyAlert {
        triggered_at: now,
        reason: AlertReason::MultipleNegativeMoods,
        message: CHECK_IN_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{check_emergency_trigger_at, AlertReason};
    use crate::model::mood::{MoodCategory, MoodEntry};
    use chrono::{TimeZone, Utc};

    fn entries(moods: &[MoodCategory]) -> Vec<MoodEntry> {
        moods
            .iter()
            .map(|mood| MoodEntry::new(*mood, "", Vec::new()))
            .collect()
    }

    #[test]
    fn only_five_most_recent_entries_count() {
        use MoodCategory::*;
        // Negative moods beyond the fifth entry are ignored.
        let list = entries(&[Happy, Happy, Sad, Sad, Sad, Angry, Angry]);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(check_emergency_trigger_at(&list, true, now).is_none());
    }

    #[test]
    fn alert_carries_reason_code_and_time() {
        use MoodCategory::*;
        let list = entries(&[Sad, Sad, Sad, Sad]);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let alert = check_emergency_trigger_at(&list, true, now).unwrap();
        assert_eq!(alert.reason.code(), "multiple-negative-moods");
        assert_eq!(alert.triggered_at, now);
        assert!(alert.message.contains("checking in"));
    }
}
