//! Mood journal entry model.
//!
//! # Invariants
//! - `tags` is an ordered set: trimmed, inner whitespace collapsed, no empty
//!   values, first occurrence wins.
//! - Collections of entries are kept newest-first.

use super::ValidationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

pub type EntryId = Uuid;

/// Tags offered by the mood form.
pub const SUGGESTED_TAGS: [&str; 8] = [
    "School",
    "Friends",
    "Family",
    "Sleep",
    "Health",
    "Social Media",
    "Homework",
    "Sports",
];

/// Fixed mood vocabulary, ordered from most to least positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodCategory {
    VeryHappy,
    Happy,
    Okay,
    Sad,
    Stressed,
    Anxious,
    Angry,
}

impl MoodCategory {
    pub const ALL: [MoodCategory; 7] = [
        MoodCategory::VeryHappy,
        MoodCategory::Happy,
        MoodCategory::Okay,
        MoodCategory::Sad,
        MoodCategory::Stressed,
        MoodCategory::Anxious,
        MoodCategory::Angry,
    ];

    /// Human-readable label used in summaries and exports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryHappy => "Very Happy",
            Self::Happy => "Happy",
            Self::Okay => "Okay",
            Self::Sad => "Sad",
            Self::Stressed => "Stressed",
            Self::Anxious => "Anxious",
            Self::Angry => "Angry",
        }
    }

    /// Storage/FFI key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::VeryHappy => "very_happy",
            Self::Happy => "happy",
            Self::Okay => "okay",
            Self::Sad => "sad",
            Self::Stressed => "stressed",
            Self::Anxious => "anxious",
            Self::Angry => "angry",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::VeryHappy => "😄",
            Self::Happy => "🙂",
            Self::Okay => "😐",
            Self::Sad => "😢",
            Self::Stressed => "😰",
            Self::Anxious => "😟",
            Self::Angry => "😠",
        }
    }

    /// Numeric score used by trend detection.
    pub const fn score(self) -> f64 {
        match self {
            Self::VeryHappy => 5.0,
            Self::Happy => 4.0,
            Self::Okay => 3.0,
            Self::Sad => 2.0,
            Self::Stressed => 2.0,
            Self::Anxious => 1.5,
            Self::Angry => 1.0,
        }
    }

    /// Moods counted by the emergency trigger heuristic.
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Sad | Self::Stressed | Self::Anxious | Self::Angry)
    }
}

impl Display for MoodCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MoodCategory {
    type Err = ValidationError;

    /// Accepts either the key (`very_happy`) or the label (`Very Happy`),
    /// case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mood| {
                mood.key() == normalized || mood.label().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| ValidationError::UnknownMood(value.trim().to_string()))
    }
}

/// One mood journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub mood: MoodCategory,
    pub note: String,
    pub tags: Vec<String>,
}

impl MoodEntry {
    /// Creates an entry stamped with the current time and a fresh id.
    pub fn new(mood: MoodCategory, note: impl Into<String>, tags: Vec<String>) -> Self {
        Self::at(Utc::now(), mood, note, tags)
    }

    /// Creates an entry with a caller-provided timestamp.
    ///
    /// Used by imports and tests where the logging time is already known.
    pub fn at(
        timestamp: DateTime<Utc>,
        mood: MoodCategory,
        note: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            mood,
            note: note.into(),
            tags: normalize_tags(tags),
        }
    }

    /// Re-applies tag normalization after direct field edits.
    pub fn normalize(&mut self) {
        self.tags = normalize_tags(std::mem::take(&mut self.tags));
    }
}

/// Normalizes a tag list into an ordered set.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| WHITESPACE_RE.replace_all(tag.as_ref().trim(), " ").into_owned())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, MoodCategory, MoodEntry};
    use crate::model::ValidationError;

    #[test]
    fn parse_accepts_keys_and_labels() {
        assert_eq!("very_happy".parse::<MoodCategory>(), Ok(MoodCategory::VeryHappy));
        assert_eq!(" Very Happy ".parse::<MoodCategory>(), Ok(MoodCategory::VeryHappy));
        assert_eq!("ANGRY".parse::<MoodCategory>(), Ok(MoodCategory::Angry));
        assert_eq!(
            "meh".parse::<MoodCategory>(),
            Err(ValidationError::UnknownMood("meh".to_string()))
        );
    }

    #[test]
    fn negative_moods_match_trigger_set() {
        let negative: Vec<_> = MoodCategory::ALL
            .into_iter()
            .filter(|mood| mood.is_negative())
            .collect();
        assert_eq!(
            negative,
            vec![
                MoodCategory::Sad,
                MoodCategory::Stressed,
                MoodCategory::Anxious,
                MoodCategory::Angry
            ]
        );
    }

    #[test]
    fn tags_are_normalized_into_ordered_set() {
        let tags = normalize_tags(["  School ", "Social   Media", "", "School", "Friends"]);
        assert_eq!(tags, vec!["School", "Social Media", "Friends"]);
    }

    #[test]
    fn new_entries_get_distinct_ids() {
        let a = MoodEntry::new(MoodCategory::Okay, "", Vec::new());
        let b = MoodEntry::new(MoodCategory::Okay, "", Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serde_uses_snake_case_mood_keys() {
        let json = serde_json::to_string(&MoodCategory::VeryHappy).unwrap();
        assert_eq!(json, "\"very_happy\"");
    }
}
