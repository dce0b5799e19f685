//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
}

/// A row from the `work_sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbWorkSession {
    pub id: String,
    pub project_id: Option<String>,
    pub description: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Canonical decimal string, e.g. `"8.00"`.
    pub duration_hours: String,
    pub billable: bool,
    pub tags: Vec<String>,
    pub privacy: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProject {
    pub id: String,
    pub name: String,
    pub status: String,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `clients` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbClient {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `employers` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmployer {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `people` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPerson {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub privacy: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `meetings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMeeting {
    pub id: String,
    pub title: String,
    pub project_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub privacy: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from `meeting_attendees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMeetingAttendee {
    pub id: String,
    pub meeting_id: String,
    pub person_id: String,
    pub attendee_role: Option<String>,
    pub created_at: String,
}

/// A row from the `reminders` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbReminder {
    pub id: String,
    pub title: String,
    pub message: Option<String>,
    pub due_at: String,
    pub completed: bool,
    pub completed_at: Option<String>,
    /// Set once the scheduler has delivered a notification for this
    /// occurrence; due reminders with this unset are pending delivery.
    pub notified_at: Option<String>,
    pub recurrence_frequency: Option<String>,
    pub recurrence_day_of_week: Option<i32>,
    pub recurrence_day_of_month: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `notes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbNote {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub privacy: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `action_items` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbActionItem {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    /// Person this item is delegated for. Exposed to queries under the
    /// historical name `on_behalf_of`.
    pub on_behalf_of_id: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

/// A row from the `bookmarks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbBookmark {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub privacy: String,
    pub created_at: String,
    pub updated_at: String,
}
