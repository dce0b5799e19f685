//! Recurrence rules for repeating reminders.
//!
//! Pure date arithmetic, no store access: given the occurrence being
//! completed and the reminder's rule, compute the next occurrence. Rules are
//! validated once at creation time and never mutated afterwards, so the
//! advance functions assume a well-formed rule.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecurrenceError {
    #[error("invalid recurrence rule: {0}")]
    InvalidRule(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(name: &str) -> Option<Frequency> {
        match name {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

/// A declarative repeat schedule. `day_of_week` (0 = Monday) is required
/// iff weekly; `day_of_month` (1–31) iff monthly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
}

impl RecurrenceRule {
    /// Validate the frequency/field pairing and ranges. Called once, before
    /// a repeating reminder is persisted — invalid rules never reach the
    /// store.
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        match self.frequency {
            Frequency::Daily => Ok(()),
            Frequency::Weekly => match self.day_of_week {
                Some(dow) if dow <= 6 => Ok(()),
                Some(dow) => Err(RecurrenceError::InvalidRule(format!(
                    "day_of_week must be 0-6, got {dow}"
                ))),
                None => Err(RecurrenceError::InvalidRule(
                    "weekly rules require day_of_week".to_string(),
                )),
            },
            Frequency::Monthly => match self.day_of_month {
                Some(dom) if (1..=31).contains(&dom) => Ok(()),
                Some(dom) => Err(RecurrenceError::InvalidRule(format!(
                    "day_of_month must be 1-31, got {dom}"
                ))),
                None => Err(RecurrenceError::InvalidRule(
                    "monthly rules require day_of_month".to_string(),
                )),
            },
        }
    }
}

/// Compute the next occurrence after `current`.
///
/// Daily advances one day and weekly a flat seven — the stored `day_of_week`
/// is informational, not a snap target. Monthly advances to the rule's
/// `day_of_month` in the next calendar month, rolling December into January
/// and clamping to the target month's length (Jan 31 → Feb 28/29).
/// Time-of-day is preserved.
pub fn next_occurrence(current: DateTime<Utc>, rule: &RecurrenceRule) -> DateTime<Utc> {
    match rule.frequency {
        Frequency::Daily => current + chrono::Duration::days(1),
        Frequency::Weekly => current + chrono::Duration::days(7),
        Frequency::Monthly => {
            let date = current.date_naive();
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            let target_day = rule.day_of_month.map(u32::from).unwrap_or(date.day());
            let day = target_day.min(days_in_month(year, month));
            let next_date = NaiveDate::from_ymd_opt(year, month, day)
                .expect("day clamped to month length");
            let naive = NaiveDateTime::new(next_date, current.time());
            DateTime::from_naive_utc_and_offset(naive, Utc)
        }
    }
}

/// Number of days in a calendar month, leap years included.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}
