//! Reminder lifecycle: rule-validated creation and atomic completion.
//!
//! Recurrence rules are validated before anything is persisted — an invalid
//! rule never reaches the store. Completing a recurring reminder and
//! creating its successor happen in one transaction: both, or neither.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DbError, DbReminder, WorkdeskDb};
use crate::recurrence::{next_occurrence, Frequency, RecurrenceError, RecurrenceRule};

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    InvalidRule(#[from] RecurrenceError),

    #[error("reminder '{0}' has an unparseable due_at: {1}")]
    InvalidDueAt(String, String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Input for scheduling a reminder.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub message: Option<String>,
    pub due_at: DateTime<Utc>,
    pub recurrence: Option<RecurrenceRule>,
}

/// Validate and persist a reminder.
pub fn create_reminder(db: &WorkdeskDb, new: &NewReminder) -> Result<DbReminder, ReminderError> {
    if let Some(rule) = &new.recurrence {
        rule.validate()?;
    }

    let now = Utc::now().to_rfc3339();
    let reminder = DbReminder {
        id: Uuid::new_v4().to_string(),
        title: new.title.clone(),
        message: new.message.clone(),
        due_at: new.due_at.to_rfc3339(),
        completed: false,
        completed_at: None,
        notified_at: None,
        recurrence_frequency: new.recurrence.map(|r| r.frequency.as_str().to_string()),
        recurrence_day_of_week: new
            .recurrence
            .and_then(|r| r.day_of_week)
            .map(i32::from),
        recurrence_day_of_month: new
            .recurrence
            .and_then(|r| r.day_of_month)
            .map(i32::from),
        created_at: now.clone(),
        updated_at: now,
    };
    db.create_reminder(&reminder)?;
    Ok(reminder)
}

/// Outcome of completing a reminder: the completed row, and the successor
/// occurrence when the reminder recurs.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub completed: DbReminder,
    pub next: Option<DbReminder>,
}

/// Complete a reminder. For recurring reminders the successor is created in
/// the same transaction that records completion.
pub fn complete_reminder(db: &WorkdeskDb, id: &str) -> Result<CompletionOutcome, ReminderError> {
    let reminder = db
        .get_reminder(id)?
        .ok_or_else(|| DbError::NotFound("reminder", id.to_string()))?;

    let successor = match rule_from_row(&reminder)? {
        Some(rule) => {
            let due_at = DateTime::parse_from_rfc3339(&reminder.due_at)
                .map_err(|e| ReminderError::InvalidDueAt(reminder.id.clone(), e.to_string()))?
                .with_timezone(&Utc);
            let now = Utc::now().to_rfc3339();
            Some(DbReminder {
                id: Uuid::new_v4().to_string(),
                due_at: next_occurrence(due_at, &rule).to_rfc3339(),
                completed: false,
                completed_at: None,
                notified_at: None,
                created_at: now.clone(),
                updated_at: now,
                ..reminder.clone()
            })
        }
        None => None,
    };

    let completed_at = Utc::now().to_rfc3339();
    db.with_transaction(|tx| {
        tx.mark_reminder_completed(id, &completed_at)?;
        if let Some(next) = &successor {
            tx.create_reminder(next)?;
        }
        Ok(())
    })?;

    let completed = db
        .get_reminder(id)?
        .ok_or_else(|| DbError::NotFound("reminder", id.to_string()))?;
    Ok(CompletionOutcome {
        completed,
        next: successor,
    })
}

/// Reconstruct the recurrence rule stored on a row. Rows were validated at
/// creation, so a malformed rule here means the row predates validation or
/// was edited by hand — surfaced, not ignored.
fn rule_from_row(reminder: &DbReminder) -> Result<Option<RecurrenceRule>, ReminderError> {
    let frequency = match reminder.recurrence_frequency.as_deref() {
        Some(name) => Frequency::parse(name).ok_or_else(|| {
            RecurrenceError::InvalidRule(format!("unknown frequency '{name}'"))
        })?,
        None => return Ok(None),
    };
    let rule = RecurrenceRule {
        frequency,
        day_of_week: reminder.recurrence_day_of_week.map(|d| d as u8),
        day_of_month: reminder.recurrence_day_of_month.map(|d| d as u8),
    };
    rule.validate()?;
    Ok(Some(rule))
}
