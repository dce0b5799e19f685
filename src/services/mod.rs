//! Workflows that sit between the tool surface and the core: reminder
//! lifecycle and free-text search.

pub mod reminders;
pub mod search;
