//! Workdesk: a personal productivity data server.
//!
//! Work sessions, meetings, people, projects, clients, employers,
//! reminders, notes, action items, and bookmarks in a local SQLite store,
//! exposed over MCP. The interesting part is the structured query engine:
//! declarative filters over dotted relationship paths and grouped
//! aggregation, compiled dynamically against a static schema registry. A
//! natural-language parser feeds the same engine, and a recurrence
//! calculator drives repeating reminders.

pub mod config;
pub mod db;
mod migrations;
pub mod nlq;
pub mod notification;
pub mod query;
pub mod recurrence;
pub mod scheduler;
pub mod schema;
pub mod services;
