//! Derived mood analytics.
//!
//! # Responsibility
//! - Summarize a snapshot of mood entries over a lookback window.
//! - Screen recent entries for the parental check-in alert.
//!
//! # Invariants
//! - Pure functions over the caller's snapshot; nothing here reads or writes
//!   persisted slots.
//! - Input order is the repository order (newest-first) and is significant.

pub mod alert;
pub mod summary;

pub use alert::{check_emergency_trigger, check_emergency_trigger_at, AlertReason, EmergencyAlert};
pub use summary::{summarize, summarize_at, MoodSummary, Timeframe, TrendDirection};
