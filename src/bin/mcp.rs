//! Workdesk MCP Server — exposes the personal productivity store to MCP
//! clients.
//!
//! Standalone binary that communicates over stdio using the Model Context
//! Protocol. Owns the SQLite database read-write and runs the reminder
//! delivery loop alongside the tool surface.
//!
//! Usage: spawned by an MCP client as configured in its server settings.

use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::model::*;
use rmcp::schemars::JsonSchema;
use rmcp::{tool, ServerHandler, ServiceExt};
use serde::Deserialize;

use workdesk_lib::config::load_config;
use workdesk_lib::db::{
    DbBookmark, DbClient, DbMeetingAttendee, DbNote, DbPerson, DbProject, DbWorkSession,
    WorkdeskDb,
};
use workdesk_lib::notification::LogNotifier;
use workdesk_lib::query::{structured_query, AggregationSpec, FilterSpec};
use workdesk_lib::recurrence::{Frequency, RecurrenceRule};
use workdesk_lib::services::reminders::{complete_reminder, create_reminder, NewReminder};
use workdesk_lib::services::search::run_search;

// =============================================================================
// Server State
// =============================================================================

/// MCP server over the workdesk store.
#[derive(Clone)]
struct WorkdeskMcp {
    /// Database handle. Wrapped in Arc<Mutex> because rusqlite::Connection
    /// is not Sync, and MCP tool calls are sequential over stdio anyway.
    db: Arc<Mutex<WorkdeskDb>>,
}

// =============================================================================
// Tool Parameter Types
// =============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct QueryParams {
    /// Entity type to query.
    #[schemars(description = "Entity type: work_session, meeting, person, project, client, employer, reminder, note, action_item, or bookmark")]
    entity_type: String,
    /// Declarative filters, AND-combined.
    #[schemars(description = "Filter list: [{field, operator, value}]. Operators: EQ, GT, GTE, LT, LTE, CONTAINS, HAS_TAG, IS_NULL, IS_NOT_NULL. Fields may be dotted relationship paths, e.g. project.name")]
    filters: Option<serde_json::Value>,
    /// Optional aggregation instead of row results.
    #[schemars(description = "Aggregation: {function: SUM|COUNT|AVG, field, group_by: [paths]}")]
    aggregation: Option<serde_json::Value>,
    /// Maximum number of rows (row queries only).
    #[schemars(description = "Max rows to return")]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchParams {
    /// Free-text query, e.g. "work sessions last week frontend".
    #[schemars(description = "Natural language query text")]
    query: String,
    /// Maximum number of rows per entity type (default 20, max 100).
    #[schemars(description = "Max rows per entity type (default 20, max 100)")]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct LogWorkSessionParams {
    #[schemars(description = "What was worked on")]
    description: String,
    /// Decimal hours as a string, e.g. "8.00".
    #[schemars(description = "Duration in hours, e.g. \"1.50\"")]
    duration_hours: String,
    #[schemars(description = "Session date (YYYY-MM-DD). Defaults to today.")]
    date: Option<String>,
    #[schemars(description = "Project name or ID to attribute the session to")]
    project: Option<String>,
    #[schemars(description = "Whether the time is billable")]
    billable: Option<bool>,
    #[schemars(description = "Tags, e.g. [\"frontend\", \"react\"]")]
    tags: Option<Vec<String>>,
    #[schemars(description = "Privacy level: public, personal, or private")]
    privacy: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddMeetingParams {
    #[schemars(description = "Meeting title")]
    title: String,
    #[schemars(description = "Start time (RFC 3339, or YYYY-MM-DD for midnight)")]
    start_time: String,
    #[schemars(description = "End time (RFC 3339)")]
    end_time: Option<String>,
    #[schemars(description = "Location or video link")]
    location: Option<String>,
    #[schemars(description = "Project name or ID")]
    project: Option<String>,
    #[schemars(description = "Attendee names or emails. Unknown people are created.")]
    attendees: Option<Vec<String>>,
    #[schemars(description = "Privacy level: public, personal, or private")]
    privacy: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddPersonParams {
    #[schemars(description = "Full name")]
    full_name: String,
    #[schemars(description = "Email address")]
    email: Option<String>,
    #[schemars(description = "Company or organization")]
    company: Option<String>,
    #[schemars(description = "Role or title")]
    role: Option<String>,
    #[schemars(description = "Privacy level: public, personal, or private")]
    privacy: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddProjectParams {
    #[schemars(description = "Project name")]
    name: String,
    #[schemars(description = "Client name; created if unknown")]
    client: Option<String>,
    #[schemars(description = "Short description")]
    description: Option<String>,
    #[schemars(description = "Status: active, paused, completed, or archived")]
    status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddNoteParams {
    #[schemars(description = "Note title")]
    title: String,
    #[schemars(description = "Note body")]
    content: Option<String>,
    #[schemars(description = "Project name or ID")]
    project: Option<String>,
    #[schemars(description = "Tags")]
    tags: Option<Vec<String>>,
    #[schemars(description = "Privacy level: public, personal, or private")]
    privacy: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddActionItemParams {
    #[schemars(description = "What needs doing")]
    title: String,
    #[schemars(description = "Due date (YYYY-MM-DD)")]
    due_date: Option<String>,
    #[schemars(description = "Priority, e.g. P1/P2/P3")]
    priority: Option<String>,
    #[schemars(description = "Project name or ID")]
    project: Option<String>,
    #[schemars(description = "Person (name or email) this item is delegated for")]
    on_behalf_of: Option<String>,
    #[schemars(description = "Tags")]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddBookmarkParams {
    #[schemars(description = "URL to save")]
    url: String,
    #[schemars(description = "Page title")]
    title: Option<String>,
    #[schemars(description = "Why this was saved")]
    description: Option<String>,
    #[schemars(description = "Tags")]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddReminderParams {
    #[schemars(description = "Reminder title")]
    title: String,
    #[schemars(description = "Notification body")]
    message: Option<String>,
    #[schemars(description = "When the reminder is due (RFC 3339, or YYYY-MM-DD for midnight)")]
    due_at: String,
    #[schemars(description = "Repeat frequency: daily, weekly, or monthly")]
    frequency: Option<String>,
    #[schemars(description = "Day of week 0-6 (Monday=0), required for weekly")]
    day_of_week: Option<u8>,
    #[schemars(description = "Day of month 1-31, required for monthly")]
    day_of_month: Option<u8>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CompleteReminderParams {
    #[schemars(description = "Reminder ID to complete")]
    id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListRemindersParams {
    #[schemars(description = "Include completed reminders (default false)")]
    include_completed: Option<bool>,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool(tool_box)]
impl WorkdeskMcp {
    fn new(db: WorkdeskDb) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, WorkdeskDb>, String> {
        self.db
            .lock()
            .map_err(|_| "Error: DB lock poisoned".to_string())
    }

    #[tool(description = "Run a structured query against the workdesk store. Supports declarative filters over dotted relationship paths (e.g. project.name, attendees.person.full_name), tag containment, and SUM/COUNT/AVG aggregation with grouping. Use this for precise questions like billable hours per project or meetings with a specific attendee.")]
    fn query(&self, #[tool(aggr)] params: QueryParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };

        let filters: Vec<FilterSpec> = match params.filters {
            Some(raw) => match serde_json::from_value(raw) {
                Ok(filters) => filters,
                Err(e) => return format!("Error: invalid filters: {e}"),
            },
            None => Vec::new(),
        };
        let aggregation: Option<AggregationSpec> = match params.aggregation {
            Some(raw) => match serde_json::from_value(raw) {
                Ok(spec) => Some(spec),
                Err(e) => return format!("Error: invalid aggregation: {e}"),
            },
            None => None,
        };

        match structured_query(
            &db,
            &params.entity_type,
            &filters,
            aggregation.as_ref(),
            params.limit,
        ) {
            Ok(result) => {
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {e}"))
            }
            Err(e) => format!("Query error: {e}"),
        }
    }

    #[tool(description = "Search the workdesk store with natural language, e.g. 'work sessions last week', 'meetings today', 'private notes this month kubernetes'. Recognizes entity types, relative date ranges, and privacy levels; leftover words become a text search.")]
    fn search(&self, #[tool(aggr)] params: SearchParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        let limit = params.limit.unwrap_or(20).clamp(1, 100);
        match run_search(&db, &params.query, Some(limit)) {
            Ok(response) => {
                serde_json::to_string_pretty(&response).unwrap_or_else(|e| format!("Error: {e}"))
            }
            Err(e) => format!("Search error: {e}"),
        }
    }

    #[tool(description = "Log a work session: what was worked on, for how long, optionally against a project. Use when the user reports time spent.")]
    fn log_work_session(&self, #[tool(aggr)] params: LogWorkSessionParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };

        let duration = match params.duration_hours.parse::<rust_decimal::Decimal>() {
            Ok(d) => d.to_string(),
            Err(_) => {
                return format!(
                    "Error: duration_hours '{}' is not a decimal",
                    params.duration_hours
                )
            }
        };
        let privacy = match validate_privacy(params.privacy.as_deref()) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let project_id = match params.project.as_deref() {
            Some(query) => match resolve_project(&db, query) {
                Ok(project) => Some(project.id),
                Err(e) => return e,
            },
            None => None,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let session = DbWorkSession {
            id: new_id(),
            project_id,
            description: params.description,
            date: params
                .date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
            start_time: None,
            end_time: None,
            duration_hours: duration,
            billable: params.billable.unwrap_or(false),
            tags: params.tags.unwrap_or_default(),
            privacy,
            created_at: now.clone(),
            updated_at: now,
        };
        match db.create_work_session(&session) {
            Ok(()) => to_json(&session),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Add a meeting with optional attendees and project. Attendees are matched to known people by name or email; unknown attendees are created.")]
    fn add_meeting(&self, #[tool(aggr)] params: AddMeetingParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };

        let start_time = match parse_timestamp(&params.start_time) {
            Ok(ts) => ts,
            Err(e) => return e,
        };
        let privacy = match validate_privacy(params.privacy.as_deref()) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let project_id = match params.project.as_deref() {
            Some(query) => match resolve_project(&db, query) {
                Ok(project) => Some(project.id),
                Err(e) => return e,
            },
            None => None,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let meeting = workdesk_lib::db::DbMeeting {
            id: new_id(),
            title: params.title,
            project_id,
            start_time,
            end_time: params.end_time,
            location: params.location,
            notes: None,
            privacy,
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        if let Err(e) = db.create_meeting(&meeting) {
            return format!("Error: {e}");
        }

        for attendee in params.attendees.unwrap_or_default() {
            let person = match ensure_person(&db, &attendee) {
                Ok(person) => person,
                Err(e) => return e,
            };
            if let Err(e) = db.add_meeting_attendee(&DbMeetingAttendee {
                id: new_id(),
                meeting_id: meeting.id.clone(),
                person_id: person.id,
                attendee_role: None,
                created_at: now.clone(),
            }) {
                return format!("Error: {e}");
            }
        }

        to_json(&meeting)
    }

    #[tool(description = "Add a person to the contact store.")]
    fn add_person(&self, #[tool(aggr)] params: AddPersonParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        let privacy = match validate_privacy(params.privacy.as_deref()) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let person = DbPerson {
            id: new_id(),
            full_name: params.full_name,
            email: params.email,
            company: params.company,
            role: params.role,
            privacy,
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        match db.create_person(&person) {
            Ok(()) => to_json(&person),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Add a project, optionally attached to a client. The client is created if it doesn't exist yet.")]
    fn add_project(&self, #[tool(aggr)] params: AddProjectParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let client_id = match params.client.as_deref() {
            Some(name) => {
                let existing = db
                    .list_clients()
                    .ok()
                    .and_then(|clients| {
                        clients
                            .into_iter()
                            .find(|c| c.name.to_lowercase() == name.to_lowercase())
                    });
                match existing {
                    Some(client) => Some(client.id),
                    None => {
                        let client = DbClient {
                            id: new_id(),
                            name: name.to_string(),
                            contact_email: None,
                            notes: None,
                            created_at: now.clone(),
                            updated_at: now.clone(),
                        };
                        if let Err(e) = db.create_client(&client) {
                            return format!("Error: {e}");
                        }
                        Some(client.id)
                    }
                }
            }
            None => None,
        };

        let project = DbProject {
            id: new_id(),
            name: params.name,
            status: params.status.unwrap_or_else(|| "active".to_string()),
            client_id,
            description: params.description,
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        match db.create_project(&project) {
            Ok(()) => to_json(&project),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Add a note, optionally attached to a project.")]
    fn add_note(&self, #[tool(aggr)] params: AddNoteParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        let privacy = match validate_privacy(params.privacy.as_deref()) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let project_id = match params.project.as_deref() {
            Some(query) => match resolve_project(&db, query) {
                Ok(project) => Some(project.id),
                Err(e) => return e,
            },
            None => None,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let note = DbNote {
            id: new_id(),
            title: params.title,
            content: params.content,
            project_id,
            tags: params.tags.unwrap_or_default(),
            privacy,
            created_at: now.clone(),
            updated_at: now,
        };
        match db.create_note(&note) {
            Ok(()) => to_json(&note),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Add an action item, optionally delegated on behalf of a person or attached to a project.")]
    fn add_action_item(&self, #[tool(aggr)] params: AddActionItemParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        let project_id = match params.project.as_deref() {
            Some(query) => match resolve_project(&db, query) {
                Ok(project) => Some(project.id),
                Err(e) => return e,
            },
            None => None,
        };
        let on_behalf_of_id = match params.on_behalf_of.as_deref() {
            Some(query) => match ensure_person(&db, query) {
                Ok(person) => Some(person.id),
                Err(e) => return e,
            },
            None => None,
        };

        let now = chrono::Utc::now().to_rfc3339();
        let item = workdesk_lib::db::DbActionItem {
            id: new_id(),
            title: params.title,
            status: "open".to_string(),
            due_date: params.due_date,
            priority: params.priority,
            project_id,
            on_behalf_of_id,
            tags: params.tags.unwrap_or_default(),
            created_at: now.clone(),
            completed_at: None,
            updated_at: now,
        };
        match db.create_action_item(&item) {
            Ok(()) => to_json(&item),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Save a bookmark.")]
    fn add_bookmark(&self, #[tool(aggr)] params: AddBookmarkParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        let now = chrono::Utc::now().to_rfc3339();
        let bookmark = DbBookmark {
            id: new_id(),
            url: params.url,
            title: params.title,
            description: params.description,
            tags: params.tags.unwrap_or_default(),
            privacy: "public".to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        match db.create_bookmark(&bookmark) {
            Ok(()) => to_json(&bookmark),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Schedule a reminder, optionally repeating daily, weekly, or monthly. Monthly reminders clamp to the last day of short months.")]
    fn add_reminder(&self, #[tool(aggr)] params: AddReminderParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };

        let due_at = match parse_timestamp(&params.due_at) {
            Ok(ts) => match chrono::DateTime::parse_from_rfc3339(&ts) {
                Ok(dt) => dt.with_timezone(&chrono::Utc),
                Err(e) => return format!("Error: {e}"),
            },
            Err(e) => return e,
        };

        let recurrence = match params.frequency.as_deref() {
            Some(name) => match Frequency::parse(name) {
                Some(frequency) => Some(RecurrenceRule {
                    frequency,
                    day_of_week: params.day_of_week,
                    day_of_month: params.day_of_month,
                }),
                None => {
                    return format!(
                        "Error: frequency must be daily, weekly, or monthly, got '{name}'"
                    )
                }
            },
            None => None,
        };

        match create_reminder(
            &db,
            &NewReminder {
                title: params.title,
                message: params.message,
                due_at,
                recurrence,
            },
        ) {
            Ok(reminder) => to_json(&reminder),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Complete a reminder. Recurring reminders automatically schedule their next occurrence.")]
    fn complete_reminder(&self, #[tool(aggr)] params: CompleteReminderParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        match complete_reminder(&db, &params.id) {
            Ok(outcome) => {
                let next = outcome.next.as_ref().map(|n| n.due_at.clone());
                serde_json::to_string_pretty(&serde_json::json!({
                    "completed": outcome.completed,
                    "nextOccurrence": next,
                }))
                .unwrap_or_else(|e| format!("Error: {e}"))
            }
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "List reminders, soonest due first.")]
    fn list_reminders(&self, #[tool(aggr)] params: ListRemindersParams) -> String {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return e,
        };
        match db.list_reminders(params.include_completed.unwrap_or(false)) {
            Ok(reminders) => to_json(&reminders),
            Err(e) => format!("Error: {e}"),
        }
    }
}

// =============================================================================
// ServerHandler — wires tool_box into the MCP protocol
// =============================================================================

#[tool(tool_box)]
impl ServerHandler for WorkdeskMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "workdesk".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Workdesk personal productivity server. Stores work sessions, meetings, \
                 people, projects, clients, reminders, notes, action items, and bookmarks. \
                 Use query for precise filtered or aggregated questions, search for natural \
                 language lookups, the add_* tools to record data, and add_reminder / \
                 complete_reminder for scheduling."
                    .to_string(),
            ),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {e}"))
}

/// Accept RFC 3339, or a bare date meaning midnight UTC.
fn parse_timestamp(raw: &str) -> Result<String, String> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&chrono::Utc).to_rfc3339());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(
                chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(midnight, chrono::Utc)
                    .to_rfc3339(),
            );
        }
    }
    Err(format!(
        "Error: '{raw}' is not an RFC 3339 timestamp or YYYY-MM-DD date"
    ))
}

fn validate_privacy(raw: Option<&str>) -> Result<String, String> {
    match raw {
        None => Ok("public".to_string()),
        Some(level @ ("public" | "personal" | "private")) => Ok(level.to_string()),
        Some(other) => Err(format!(
            "Error: privacy must be public, personal, or private, got '{other}'"
        )),
    }
}

/// Resolve a user-provided project identifier (name or ID).
fn resolve_project(db: &WorkdeskDb, query: &str) -> Result<DbProject, String> {
    if let Ok(Some(project)) = db.get_project(query) {
        return Ok(project);
    }
    match db.find_project_by_name(query) {
        Ok(Some(project)) => Ok(project),
        Ok(None) => Err(format!(
            "Error: no project matching '{query}'. Create it first with add_project."
        )),
        Err(e) => Err(format!("Error: {e}")),
    }
}

/// Find a person by name or email, creating a minimal record when unknown.
fn ensure_person(db: &WorkdeskDb, query: &str) -> Result<DbPerson, String> {
    match db.find_person(query) {
        Ok(Some(person)) => Ok(person),
        Ok(None) => {
            let now = chrono::Utc::now().to_rfc3339();
            let person = DbPerson {
                id: new_id(),
                full_name: query.to_string(),
                email: query.contains('@').then(|| query.to_lowercase()),
                company: None,
                role: None,
                privacy: "public".to_string(),
                tags: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
            };
            db.create_person(&person).map_err(|e| format!("Error: {e}"))?;
            Ok(person)
        }
        Err(e) => Err(format!("Error: {e}")),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    let db = match &config.db_path {
        Some(path) => WorkdeskDb::open_at(path.clone()),
        None => WorkdeskDb::open(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;

    // The reminder loop gets its own handle so notifications keep flowing
    // while tool calls hold the server's connection.
    let scheduler_db = match &config.db_path {
        Some(path) => WorkdeskDb::open_at(path.clone()),
        None => WorkdeskDb::open(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to open scheduler database: {e}"))?;
    tokio::spawn(workdesk_lib::scheduler::run_reminder_loop(
        scheduler_db,
        config.reminder_check_minutes,
        Arc::new(LogNotifier),
    ));

    let server = WorkdeskMcp::new(db);
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
