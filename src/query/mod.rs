//! Structured query engine.
//!
//! The primary query entry point for the tool surface: a caller names an
//! entity type, a list of declarative filters (AND-combined), and optionally
//! an aggregation, and the engine compiles and executes the corresponding
//! SQL in a single pass. Compile-time errors (unknown entity, bad path, type
//! mismatch) abort the whole call before anything reaches the store —
//! partial results are never returned.
//!
//! Results are request-scoped snapshots: nothing here is cached or persisted
//! between invocations, and concurrent calls share no mutable state.

pub mod aggregate;
mod error;
pub mod filter;

pub use aggregate::{
    AggregateFunction, AggregateValue, AggregationGroup, AggregationResult, AggregationSpec,
};
pub use error::QueryError;
pub use filter::{compile_filter, compile_filters, CompiledFilters, FilterOperator, FilterSpec};

use serde::Serialize;

use crate::db::WorkdeskDb;
use crate::schema::{schema_for, EntityType, FieldType};

/// Result of a structured query: plain entity rows, or an aggregation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows {
        entity_type: String,
        total_count: usize,
        results: Vec<serde_json::Value>,
    },
    Aggregate(AggregationResult),
}

/// Execute a structured query.
///
/// 1. Validate `entity_type` against the registry.
/// 2. Compile all filters into one combined predicate.
/// 3. With an aggregation: delegate to the aggregation compiler under the
///    combined predicate.
/// 4. Without: plain select of the entity's scalar fields, `DISTINCT` when
///    any join is present so join fan-out never multiplies rows.
pub fn structured_query(
    db: &WorkdeskDb,
    entity_type: &str,
    filters: &[FilterSpec],
    aggregation: Option<&AggregationSpec>,
    limit: Option<i64>,
) -> Result<QueryResult, QueryError> {
    let entity = EntityType::parse(entity_type)
        .ok_or_else(|| QueryError::UnknownEntityType(entity_type.to_string()))?;

    let compiled = compile_filters(entity, filters)?;

    if let Some(spec) = aggregation {
        let result = aggregate::run_aggregation(db.conn_ref(), entity, compiled, spec)?;
        return Ok(QueryResult::Aggregate(result));
    }

    select_rows(db, entity, compiled, limit)
}

fn select_rows(
    db: &WorkdeskDb,
    entity: EntityType,
    mut compiled: CompiledFilters,
    limit: Option<i64>,
) -> Result<QueryResult, QueryError> {
    let schema = schema_for(entity);

    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("{}.{}", schema.table, f.column))
        .collect();

    let distinct = if compiled.has_joins() { "DISTINCT " } else { "" };
    let mut sql = format!(
        "SELECT {distinct}{} FROM {}{}{}",
        columns.join(", "),
        schema.table,
        compiled.join_clause(),
        compiled.where_clause(),
    );
    if let Some(n) = limit {
        compiled.params.push(Box::new(n));
        sql.push_str(&format!(" LIMIT ?{}", compiled.params.len()));
    }

    let mut stmt = db.conn_ref().prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(
        compiled.params.iter().map(|p| p.as_ref()),
    ))?;

    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = serde_json::Map::with_capacity(schema.fields.len());
        for (i, field) in schema.fields.iter().enumerate() {
            let raw: rusqlite::types::Value = row.get(i)?;
            object.insert(field.name.to_string(), cell_to_json(field.field_type, raw));
        }
        results.push(serde_json::Value::Object(object));
    }

    Ok(QueryResult::Rows {
        entity_type: entity.as_str().to_string(),
        total_count: results.len(),
        results,
    })
}

/// Map a stored cell to its public JSON shape: booleans back to booleans,
/// tag arrays back to arrays, decimals as canonical strings.
fn cell_to_json(field_type: FieldType, raw: rusqlite::types::Value) -> serde_json::Value {
    use rusqlite::types::Value;
    match (field_type, raw) {
        (_, Value::Null) => serde_json::Value::Null,
        (FieldType::Boolean, Value::Integer(n)) => serde_json::Value::from(n != 0),
        (FieldType::StringArray, Value::Text(s)) => {
            serde_json::from_str(&s).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
        }
        (_, Value::Integer(n)) => serde_json::Value::from(n),
        (_, Value::Real(f)) => serde_json::Value::from(f),
        (_, Value::Text(s)) => serde_json::Value::from(s),
        (_, Value::Blob(_)) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        DbActionItem, DbMeeting, DbMeetingAttendee, DbPerson, DbWorkSession, WorkdeskDb,
    };
    use serde_json::json;

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    fn session(id: &str, tags: &[&str]) -> DbWorkSession {
        DbWorkSession {
            id: id.to_string(),
            project_id: None,
            description: format!("session {id}"),
            date: "2026-03-02".to_string(),
            start_time: None,
            end_time: None,
            duration_hours: "8.00".to_string(),
            billable: true,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            privacy: "public".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn person(id: &str, name: &str, company: &str) -> DbPerson {
        DbPerson {
            id: id.to_string(),
            full_name: name.to_string(),
            email: None,
            company: Some(company.to_string()),
            role: None,
            privacy: "public".to_string(),
            tags: Vec::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn meeting(id: &str, title: &str) -> DbMeeting {
        DbMeeting {
            id: id.to_string(),
            title: title.to_string(),
            project_id: None,
            start_time: "2026-03-02T10:00:00+00:00".to_string(),
            end_time: None,
            location: None,
            notes: None,
            privacy: "public".to_string(),
            tags: Vec::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn action_item(id: &str, on_behalf_of: Option<&str>) -> DbActionItem {
        DbActionItem {
            id: id.to_string(),
            title: format!("item {id}"),
            status: "open".to_string(),
            due_date: None,
            priority: None,
            project_id: None,
            on_behalf_of_id: on_behalf_of.map(str::to_string),
            tags: Vec::new(),
            created_at: now(),
            completed_at: None,
            updated_at: now(),
        }
    }

    fn filter(field: &str, operator: FilterOperator, value: serde_json::Value) -> FilterSpec {
        FilterSpec {
            field: field.to_string(),
            operator,
            value: Some(value),
        }
    }

    fn row_count(result: QueryResult) -> usize {
        match result {
            QueryResult::Rows { total_count, .. } => total_count,
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_entity_type_is_fatal() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        let err = structured_query(&db, "spreadsheet", &[], None, None).unwrap_err();
        assert!(matches!(err, QueryError::UnknownEntityType(_)));
    }

    #[test]
    fn test_empty_filters_return_all_rows() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", &[])).unwrap();
        db.create_work_session(&session("s2", &[])).unwrap();

        let result = structured_query(&db, "work_session", &[], None, None).unwrap();
        assert_eq!(row_count(result), 2);
    }

    #[test]
    fn test_limit_caps_results() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        for id in ["s1", "s2", "s3"] {
            db.create_work_session(&session(id, &[])).unwrap();
        }
        let result = structured_query(&db, "work_session", &[], None, Some(2)).unwrap();
        assert_eq!(row_count(result), 2);
    }

    #[test]
    fn test_has_tag_matches_array_membership() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", &["frontend", "react"]))
            .unwrap();
        db.create_work_session(&session("s2", &["backend", "api"]))
            .unwrap();
        db.create_work_session(&session("s3", &["frontend", "backend"]))
            .unwrap();

        let result = structured_query(
            &db,
            "work_session",
            &[filter("tags", FilterOperator::HasTag, json!("frontend"))],
            None,
            None,
        )
        .unwrap();
        match result {
            QueryResult::Rows { results, .. } => {
                let ids: Vec<&str> = results
                    .iter()
                    .map(|r| r["id"].as_str().unwrap())
                    .collect();
                assert_eq!(ids, vec!["s1", "s3"]);
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_null_checks_split_the_dataset() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_person(&person("p1", "Dana Reyes", "Acme")).unwrap();
        db.create_action_item(&action_item("a1", Some("p1"))).unwrap();
        db.create_action_item(&action_item("a2", None)).unwrap();
        db.create_action_item(&action_item("a3", None)).unwrap();

        let is_null = FilterSpec {
            field: "on_behalf_of".to_string(),
            operator: FilterOperator::IsNull,
            value: None,
        };
        let result = structured_query(&db, "action_item", &[is_null], None, None).unwrap();
        assert_eq!(row_count(result), 2);

        let is_not_null = FilterSpec {
            field: "on_behalf_of".to_string(),
            operator: FilterOperator::IsNotNull,
            value: None,
        };
        let result = structured_query(&db, "action_item", &[is_not_null], None, None).unwrap();
        assert_eq!(row_count(result), 1);
    }

    #[test]
    fn test_repeated_join_path_does_not_multiply_rows() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_meeting(&meeting("m1", "Planning")).unwrap();
        db.create_person(&person("p1", "Dana Reyes", "Acme")).unwrap();
        db.create_person(&person("p2", "Lee Osei", "Acme")).unwrap();
        db.add_meeting_attendee(&DbMeetingAttendee {
            id: "at1".to_string(),
            meeting_id: "m1".to_string(),
            person_id: "p1".to_string(),
            attendee_role: None,
            created_at: now(),
        })
        .unwrap();
        db.add_meeting_attendee(&DbMeetingAttendee {
            id: "at2".to_string(),
            meeting_id: "m1".to_string(),
            person_id: "p2".to_string(),
            attendee_role: None,
            created_at: now(),
        })
        .unwrap();

        // Baseline: one filter through attendees → person. Two attendees
        // match, but the meeting comes back once.
        let baseline = structured_query(
            &db,
            "meeting",
            &[filter(
                "attendees.person.company",
                FilterOperator::Contains,
                json!("acme"),
            )],
            None,
            None,
        )
        .unwrap();
        assert_eq!(row_count(baseline), 1);

        // A second filter over the same relationship prefix must not add a
        // second join or change the row count.
        let doubled = structured_query(
            &db,
            "meeting",
            &[
                filter(
                    "attendees.person.company",
                    FilterOperator::Contains,
                    json!("acme"),
                ),
                FilterSpec {
                    field: "attendees.person.full_name".to_string(),
                    operator: FilterOperator::IsNotNull,
                    value: None,
                },
            ],
            None,
            None,
        )
        .unwrap();
        assert_eq!(row_count(doubled), 1);
    }

    #[test]
    fn test_compile_error_aborts_before_execution() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", &[])).unwrap();

        let err = structured_query(
            &db,
            "work_session",
            &[
                filter("description", FilterOperator::Contains, json!("session")),
                filter("nonexistent", FilterOperator::Eq, json!(1)),
            ],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn test_rows_carry_typed_json_shapes() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", &["deep-work"])).unwrap();

        let result = structured_query(&db, "work_session", &[], None, None).unwrap();
        match result {
            QueryResult::Rows { results, .. } => {
                let row = &results[0];
                assert_eq!(row["billable"], json!(true));
                assert_eq!(row["tags"], json!(["deep-work"]));
                assert_eq!(row["duration_hours"], json!("8.00"));
                assert_eq!(row["project_id"], serde_json::Value::Null);
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }
}
