//! Time-windowed mood summary.
//!
//! # Invariants
//! - Top tags are ranked by descending count; ties keep first-occurrence
//!   order.
//! - Trend thresholds are strict: a difference of exactly 0.5 is `Stable`.
//! - The trend compares `mean(second half) - mean(first half)` of the
//!   newest-first list, so the "first half" is the more recent one. This
//!   mirrors the shipped behavior and is pinned by tests.
//! - Average-mood ties resolve to the category that appears first in the
//!   filtered list.

use crate::model::mood::{MoodCategory, MoodEntry};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

const TOP_TAG_LIMIT: usize = 5;
const MIN_ENTRIES_FOR_TREND: usize = 4;
const TREND_THRESHOLD: f64 = 0.5;

/// Caller-selected lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    LastWeek,
    #[default]
    LastTwoWeeks,
    LastMonth,
    Last90Days,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::LastWeek,
        Timeframe::LastTwoWeeks,
        Timeframe::LastMonth,
        Timeframe::Last90Days,
    ];

    pub const fn days(self) -> i64 {
        match self {
            Self::LastWeek => 7,
            Self::LastTwoWeeks => 14,
            Self::LastMonth => 30,
            Self::Last90Days => 90,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::LastWeek => "Last 7 days",
            Self::LastTwoWeeks => "Last 14 days",
            Self::LastMonth => "Last 30 days",
            Self::Last90Days => "Last 90 days",
        }
    }

    /// Maps a day count onto a supported window.
    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|timeframe| timeframe.days() == days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient_data",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Improving => "Improving",
            Self::Declining => "Declining",
            Self::Stable => "Stable",
            Self::InsufficientData => "Not enough data yet",
        }
    }
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodSummary {
    pub date_range: String,
    pub total_entries: usize,
    pub mood_breakdown: BTreeMap<MoodCategory, usize>,
    pub top_tags: Vec<String>,
    pub average_mood: String,
    pub trend: TrendDirection,
}

impl MoodSummary {
    fn empty(timeframe: Timeframe) -> Self {
        Self {
            date_range: timeframe.description().to_string(),
            total_entries: 0,
            mood_breakdown: BTreeMap::new(),
            top_tags: Vec::new(),
            average_mood: "No data".to_string(),
            trend: TrendDirection::InsufficientData,
        }
    }

    /// Plain-text summary suitable for sending to a parent or guardian.
    ///
    /// Contains counts, moods and tags only. Entry notes never appear.
    pub fn shareable_text(&self) -> String {
        let mut text = String::from("StressMind Mood Summary\n");
        text.push_str(&format!("{}\n\n", self.date_range));
        text.push_str(&format!("Entries logged: {}\n", self.total_entries));
        text.push_str(&format!("Overall mood: {}\n", self.average_mood));
        text.push_str(&format!("Trend: {}\n", self.trend.label()));

        if !self.mood_breakdown.is_empty() {
            text.push_str("\nMood breakdown:\n");
            for (mood, count) in &self.mood_breakdown {
                text.push_str(&format!("- {} {}: {}\n", mood.emoji(), mood.label(), count));
            }
        }

        if !self.top_tags.is_empty() {
            text.push_str(&format!("\nCommon themes: {}\n", self.top_tags.join(", ")));
        }

        text.push_str("\nPersonal notes are never included in this summary.\n");
        text
    }
}

/// Summarizes `entries` over `timeframe` ending now.
pub fn summarize(entries: &[MoodEntry], timeframe: Timeframe) -> MoodSummary {
    summarize_at(entries, timeframe, Utc::now())
}

/// Summarizes `entries` with timestamps at or after `now - timeframe`.
///
/// `entries` must be in repository order (newest-first).
pub fn summarize_at(entries: &[MoodEntry], timeframe: Timeframe, now: DateTime<Utc>) -> MoodSummary {
    let cutoff = now - Duration::days(timeframe.days());
    let filtered: Vec<&MoodEntry> = entries
        .iter()
        .filter(|entry| entry.timestamp >= cutoff)
        .collect();

    if filtered.is_empty() {
        return MoodSummary::empty(timeframe);
    }

    let mut mood_breakdown = BTreeMap::new();
    for entry in &filtered {
        *mood_breakdown.entry(entry.mood).or_insert(0) += 1;
    }

    MoodSummary {
        date_range: timeframe.description().to_string(),
        total_entries: filtered.len(),
        top_tags: top_tags(&filtered, TOP_TAG_LIMIT),
        average_mood: average_mood(&filtered, &mood_breakdown),
        trend: trend(&filtered),
        mood_breakdown,
    }
}

fn top_tags(entries: &[&MoodEntry], limit: usize) -> Vec<String> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tag in entries.iter().flat_map(|entry| entry.tags.iter()) {
        match positions.get(tag.as_str()) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(tag.as_str(), counts.len());
                counts.push((tag.as_str(), 1));
            }
        }
    }
    // Stable sort keeps first-occurrence order among equal counts.
    counts.sort_by(|left, right| right.1.cmp(&left.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn trend(entries: &[&MoodEntry]) -> TrendDirection {
    if entries.len() < MIN_ENTRIES_FOR_TREND {
        return TrendDirection::InsufficientData;
    }

    let (first_half, second_half) = entries.split_at(entries.len() / 2);
    let difference = mean_score(second_half) - mean_score(first_half);

    if difference > TREND_THRESHOLD {
        TrendDirection::Improving
    } else if difference < -TREND_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

fn mean_score(entries: &[&MoodEntry]) -> f64 {
    let total: f64 = entries.iter().map(|entry| entry.mood.score()).sum();
    total / entries.len() as f64
}

fn average_mood(entries: &[&MoodEntry], breakdown: &BTreeMap<MoodCategory, usize>) -> String {
    let mut leader: Option<(MoodCategory, usize)> = None;
    for entry in entries {
        let count = breakdown.get(&entry.mood).copied().unwrap_or(0);
        if leader.map_or(true, |(_, best)| count > best) {
            leader = Some((entry.mood, count));
        }
    }

    let Some((mood, count)) = leader else {
        return "Varied".to_string();
    };
    let share = count as f64 / entries.len() as f64;
    if share > 0.5 {
        format!("Mostly {}", mood.label())
    } else {
        format!("Mixed ({} most common)", mood.label())
    }
}
