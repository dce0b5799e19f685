//! Static entity schema registry.
//!
//! One entry per entity type: its table, scalar fields (public name →
//! physical column + value type), relationship edges, and field aliases for
//! historical renames. The structured query engine never touches a physical
//! column name directly — every filter and group-by path goes through
//! `resolve_path`, which walks dotted relationship chains and fails fast on
//! the first segment that doesn't resolve.
//!
//! The registry is immutable after first use (`OnceLock`); lookups allocate
//! nothing beyond the returned `ResolvedPath`.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::query::QueryError;

/// The fixed set of entity types the server stores and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    WorkSession,
    Meeting,
    MeetingAttendee,
    Person,
    Project,
    Client,
    Employer,
    Reminder,
    Note,
    ActionItem,
    Bookmark,
}

impl EntityType {
    /// Every declared entity type, attendee join rows included.
    pub const ALL: &'static [EntityType] = &[
        EntityType::WorkSession,
        EntityType::Meeting,
        EntityType::MeetingAttendee,
        EntityType::Person,
        EntityType::Project,
        EntityType::Client,
        EntityType::Employer,
        EntityType::Reminder,
        EntityType::Note,
        EntityType::ActionItem,
        EntityType::Bookmark,
    ];

    /// Entity types a user would name in a query. Excludes the attendee
    /// join entity, which exists for path traversal rather than direct use.
    pub const USER_FACING: &'static [EntityType] = &[
        EntityType::WorkSession,
        EntityType::Meeting,
        EntityType::Person,
        EntityType::Project,
        EntityType::Client,
        EntityType::Employer,
        EntityType::Reminder,
        EntityType::Note,
        EntityType::ActionItem,
        EntityType::Bookmark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::WorkSession => "work_session",
            EntityType::Meeting => "meeting",
            EntityType::MeetingAttendee => "meeting_attendee",
            EntityType::Person => "person",
            EntityType::Project => "project",
            EntityType::Client => "client",
            EntityType::Employer => "employer",
            EntityType::Reminder => "reminder",
            EntityType::Note => "note",
            EntityType::ActionItem => "action_item",
            EntityType::Bookmark => "bookmark",
        }
    }

    /// Parse a wire-format entity type name. Unknown names are an error at
    /// the query layer, never an empty result.
    pub fn parse(name: &str) -> Option<EntityType> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == name)
    }
}

/// Declared value type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    /// Canonical decimal string in storage (e.g. `"8.00"`). Aggregated with
    /// exact decimal arithmetic, never through REAL.
    Decimal,
    /// `YYYY-MM-DD` text.
    Date,
    /// RFC 3339 UTC text.
    Timestamp,
    Enum,
    Boolean,
    /// JSON array of strings in a TEXT column (tag lists).
    StringArray,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Enum => "enum",
            FieldType::Boolean => "boolean",
            FieldType::StringArray => "string_array",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Decimal)
    }
}

/// One scalar field: public name, physical column, declared type.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// One relationship edge. The join condition is
/// `<source_alias>.<local_col> = <target_alias>.<foreign_col>`.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipDef {
    pub name: &'static str,
    pub target: EntityType,
    pub cardinality: Cardinality,
    pub local_col: &'static str,
    pub foreign_col: &'static str,
}

/// Schema registry entry for one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    pub entity: EntityType,
    pub table: &'static str,
    /// Declaration order is the projection order for plain selects.
    pub fields: Vec<FieldDef>,
    pub relationships: Vec<RelationshipDef>,
    /// Query-facing name → underlying field name (historical renames).
    /// Applied to the terminal path segment only.
    pub aliases: &'static [(&'static str, &'static str)],
    /// Field the search service constrains when a parsed query carries a
    /// date range.
    pub default_date_field: Option<&'static str>,
    /// Field the search service matches residual free text against.
    pub search_field: Option<&'static str>,
}

impl EntitySchema {
    /// Look up a scalar field by public name, trying the alias table first.
    pub fn scalar_field(&self, name: &str) -> Option<&FieldDef> {
        let resolved = self
            .aliases
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, target)| *target)
            .unwrap_or(name);
        self.fields.iter().find(|f| f.name == resolved)
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn has_privacy_field(&self) -> bool {
        self.scalar_field("privacy").is_some()
    }
}

/// One join introduced by a relationship hop. `key` is the dotted path
/// prefix up to and including this hop — the deduplication key: two filters
/// traversing the same prefix share one join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinHop {
    pub key: String,
    pub table: &'static str,
    pub alias: String,
    pub on: String,
    pub many: bool,
}

/// A fully resolved field path: the joins to introduce, and the terminal
/// column with its declared type.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub joins: Vec<JoinHop>,
    /// Table alias the terminal column selects from (the base table name
    /// when the path has no hops).
    pub table_alias: String,
    pub column: &'static str,
    pub field_type: FieldType,
}

impl ResolvedPath {
    /// `alias.column`, ready to splice into SQL.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table_alias, self.column)
    }
}

fn field(name: &'static str, column: &'static str, field_type: FieldType) -> FieldDef {
    FieldDef {
        name,
        column,
        field_type,
    }
}

fn rel(
    name: &'static str,
    target: EntityType,
    cardinality: Cardinality,
    local_col: &'static str,
    foreign_col: &'static str,
) -> RelationshipDef {
    RelationshipDef {
        name,
        target,
        cardinality,
        local_col,
        foreign_col,
    }
}

fn build_registry() -> HashMap<EntityType, EntitySchema> {
    use Cardinality::{Many, One};
    use FieldType::*;

    let mut reg = HashMap::new();

    reg.insert(
        EntityType::WorkSession,
        EntitySchema {
            entity: EntityType::WorkSession,
            table: "work_sessions",
            fields: vec![
                field("id", "id", String),
                field("project_id", "project_id", String),
                field("description", "description", String),
                field("date", "date", Date),
                field("start_time", "start_time", Timestamp),
                field("end_time", "end_time", Timestamp),
                field("duration_hours", "duration_hours", Decimal),
                field("billable", "billable", Boolean),
                field("tags", "tags", StringArray),
                field("privacy", "privacy", Enum),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![rel("project", EntityType::Project, One, "project_id", "id")],
            aliases: &[],
            default_date_field: Some("date"),
            search_field: Some("description"),
        },
    );

    reg.insert(
        EntityType::Project,
        EntitySchema {
            entity: EntityType::Project,
            table: "projects",
            fields: vec![
                field("id", "id", String),
                field("name", "name", String),
                field("status", "status", Enum),
                field("client_id", "client_id", String),
                field("description", "description", String),
                field("tags", "tags", StringArray),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![
                rel("client", EntityType::Client, One, "client_id", "id"),
                rel("sessions", EntityType::WorkSession, Many, "id", "project_id"),
            ],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("name"),
        },
    );

    reg.insert(
        EntityType::Client,
        EntitySchema {
            entity: EntityType::Client,
            table: "clients",
            fields: vec![
                field("id", "id", String),
                field("name", "name", String),
                field("contact_email", "contact_email", String),
                field("notes", "notes", String),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![rel(
                "projects",
                EntityType::Project,
                Many,
                "id",
                "client_id",
            )],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("name"),
        },
    );

    reg.insert(
        EntityType::Employer,
        EntitySchema {
            entity: EntityType::Employer,
            table: "employers",
            fields: vec![
                field("id", "id", String),
                field("name", "name", String),
                field("notes", "notes", String),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("name"),
        },
    );

    reg.insert(
        EntityType::Person,
        EntitySchema {
            entity: EntityType::Person,
            table: "people",
            fields: vec![
                field("id", "id", String),
                field("full_name", "full_name", String),
                field("email", "email", String),
                field("company", "company", String),
                field("role", "role", String),
                field("privacy", "privacy", Enum),
                field("tags", "tags", StringArray),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("full_name"),
        },
    );

    reg.insert(
        EntityType::Meeting,
        EntitySchema {
            entity: EntityType::Meeting,
            table: "meetings",
            fields: vec![
                field("id", "id", String),
                field("title", "title", String),
                field("project_id", "project_id", String),
                field("start_time", "start_time", Timestamp),
                field("end_time", "end_time", Timestamp),
                field("location", "location", String),
                field("notes", "notes", String),
                field("privacy", "privacy", Enum),
                field("tags", "tags", StringArray),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![
                rel("project", EntityType::Project, One, "project_id", "id"),
                rel(
                    "attendees",
                    EntityType::MeetingAttendee,
                    Many,
                    "id",
                    "meeting_id",
                ),
            ],
            aliases: &[],
            default_date_field: Some("start_time"),
            search_field: Some("title"),
        },
    );

    reg.insert(
        EntityType::MeetingAttendee,
        EntitySchema {
            entity: EntityType::MeetingAttendee,
            table: "meeting_attendees",
            fields: vec![
                field("id", "id", String),
                field("meeting_id", "meeting_id", String),
                field("person_id", "person_id", String),
                field("attendee_role", "attendee_role", String),
                field("created_at", "created_at", Timestamp),
            ],
            relationships: vec![
                rel("meeting", EntityType::Meeting, One, "meeting_id", "id"),
                rel("person", EntityType::Person, One, "person_id", "id"),
            ],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: None,
        },
    );

    reg.insert(
        EntityType::Reminder,
        EntitySchema {
            entity: EntityType::Reminder,
            table: "reminders",
            fields: vec![
                field("id", "id", String),
                field("title", "title", String),
                field("message", "message", String),
                field("due_at", "due_at", Timestamp),
                field("completed", "completed", Boolean),
                field("completed_at", "completed_at", Timestamp),
                field("notified_at", "notified_at", Timestamp),
                field("recurrence_frequency", "recurrence_frequency", Enum),
                field("recurrence_day_of_week", "recurrence_day_of_week", Integer),
                field(
                    "recurrence_day_of_month",
                    "recurrence_day_of_month",
                    Integer,
                ),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![],
            aliases: &[],
            default_date_field: Some("due_at"),
            search_field: Some("title"),
        },
    );

    reg.insert(
        EntityType::Note,
        EntitySchema {
            entity: EntityType::Note,
            table: "notes",
            fields: vec![
                field("id", "id", String),
                field("title", "title", String),
                field("content", "content", String),
                field("project_id", "project_id", String),
                field("tags", "tags", StringArray),
                field("privacy", "privacy", Enum),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![rel("project", EntityType::Project, One, "project_id", "id")],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("title"),
        },
    );

    reg.insert(
        EntityType::ActionItem,
        EntitySchema {
            entity: EntityType::ActionItem,
            table: "action_items",
            fields: vec![
                field("id", "id", String),
                field("title", "title", String),
                field("status", "status", Enum),
                field("due_date", "due_date", Date),
                field("priority", "priority", Enum),
                field("project_id", "project_id", String),
                field("on_behalf_of_id", "on_behalf_of_id", String),
                field("tags", "tags", StringArray),
                field("created_at", "created_at", Timestamp),
                field("completed_at", "completed_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![rel("project", EntityType::Project, One, "project_id", "id")],
            // The delegation FK was renamed when person linking landed;
            // queries still use the original name.
            aliases: &[("on_behalf_of", "on_behalf_of_id")],
            default_date_field: Some("created_at"),
            search_field: Some("title"),
        },
    );

    reg.insert(
        EntityType::Bookmark,
        EntitySchema {
            entity: EntityType::Bookmark,
            table: "bookmarks",
            fields: vec![
                field("id", "id", String),
                field("url", "url", String),
                field("title", "title", String),
                field("description", "description", String),
                field("tags", "tags", StringArray),
                field("privacy", "privacy", Enum),
                field("created_at", "created_at", Timestamp),
                field("updated_at", "updated_at", Timestamp),
            ],
            relationships: vec![],
            aliases: &[],
            default_date_field: Some("created_at"),
            search_field: Some("title"),
        },
    );

    reg
}

/// The process-wide registry. Built on first access, immutable after.
pub fn registry() -> &'static HashMap<EntityType, EntitySchema> {
    static REGISTRY: OnceLock<HashMap<EntityType, EntitySchema>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Schema entry for an entity type. Total over `EntityType` — every variant
/// is declared in `build_registry`.
pub fn schema_for(entity: EntityType) -> &'static EntitySchema {
    registry()
        .get(&entity)
        .unwrap_or_else(|| panic!("registry missing declared entity {}", entity.as_str()))
}

/// Resolve a dotted field path against the registry.
///
/// The last segment is the terminal field; every prior segment must name a
/// relationship on the entity reached so far. Alias resolution applies to
/// the terminal segment only. Fails on the first invalid segment.
pub fn resolve_path(entity: EntityType, path: &str) -> Result<ResolvedPath, QueryError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(QueryError::UnknownField {
            path: path.to_string(),
            segment: path.to_string(),
        });
    }

    let (terminal, hops) = match segments.split_last() {
        Some(split) => split,
        None => {
            return Err(QueryError::UnknownField {
                path: path.to_string(),
                segment: path.to_string(),
            })
        }
    };

    let mut current = schema_for(entity);
    let mut current_alias = current.table.to_string();
    let mut prefix = String::new();
    let mut joins = Vec::with_capacity(hops.len());

    for hop in hops {
        let relationship = current.relationship(hop).ok_or_else(|| QueryError::UnknownField {
            path: path.to_string(),
            segment: hop.to_string(),
        })?;

        if prefix.is_empty() {
            prefix.push_str(hop);
        } else {
            prefix.push('.');
            prefix.push_str(hop);
        }

        let target = schema_for(relationship.target);
        let alias = format!("j_{}", prefix.replace('.', "_"));
        let on = format!(
            "{}.{} = {}.{}",
            current_alias, relationship.local_col, alias, relationship.foreign_col
        );

        joins.push(JoinHop {
            key: prefix.clone(),
            table: target.table,
            alias: alias.clone(),
            on,
            many: relationship.cardinality == Cardinality::Many,
        });

        current = target;
        current_alias = alias;
    }

    let field_def = current
        .scalar_field(terminal)
        .ok_or_else(|| QueryError::UnknownField {
            path: path.to_string(),
            segment: terminal.to_string(),
        })?;

    Ok(ResolvedPath {
        joins,
        table_alias: current_alias,
        column: field_def.column,
        field_type: field_def.field_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_field_resolves_without_joins() {
        let resolved = resolve_path(EntityType::WorkSession, "duration_hours").unwrap();
        assert!(resolved.joins.is_empty());
        assert_eq!(resolved.table_alias, "work_sessions");
        assert_eq!(resolved.column, "duration_hours");
        assert_eq!(resolved.field_type, FieldType::Decimal);
    }

    #[test]
    fn test_single_hop_path() {
        let resolved = resolve_path(EntityType::WorkSession, "project.name").unwrap();
        assert_eq!(resolved.joins.len(), 1);
        assert_eq!(resolved.joins[0].key, "project");
        assert_eq!(resolved.joins[0].table, "projects");
        assert_eq!(
            resolved.joins[0].on,
            "work_sessions.project_id = j_project.id"
        );
        assert_eq!(resolved.qualified(), "j_project.name");
    }

    #[test]
    fn test_multi_hop_path_through_many_relationship() {
        let resolved = resolve_path(EntityType::Meeting, "attendees.person.full_name").unwrap();
        assert_eq!(resolved.joins.len(), 2);
        assert_eq!(resolved.joins[0].key, "attendees");
        assert!(resolved.joins[0].many);
        assert_eq!(resolved.joins[1].key, "attendees.person");
        assert!(!resolved.joins[1].many);
        assert_eq!(
            resolved.joins[1].on,
            "j_attendees.person_id = j_attendees_person.id"
        );
        assert_eq!(resolved.qualified(), "j_attendees_person.full_name");
    }

    #[test]
    fn test_bad_relationship_segment_names_the_segment() {
        let err = resolve_path(EntityType::WorkSession, "sprint.name").unwrap_err();
        match err {
            QueryError::UnknownField { segment, .. } => assert_eq!(segment, "sprint"),
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_terminal_segment_names_the_segment() {
        let err = resolve_path(EntityType::WorkSession, "project.owner").unwrap_err();
        match err {
            QueryError::UnknownField { segment, .. } => assert_eq!(segment, "owner"),
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_applies_to_terminal_only() {
        let resolved = resolve_path(EntityType::ActionItem, "on_behalf_of").unwrap();
        assert_eq!(resolved.column, "on_behalf_of_id");
        assert_eq!(resolved.field_type, FieldType::String);
    }

    #[test]
    fn test_every_entity_type_parses_its_own_name() {
        for entity in EntityType::ALL {
            assert_eq!(EntityType::parse(entity.as_str()), Some(*entity));
        }
        assert_eq!(EntityType::parse("spreadsheet"), None);
    }
}
