//! Free-text search: natural-language parse, then one structured query per
//! matched entity type.
//!
//! The parser's `None` / empty-list distinction is preserved exactly:
//! `entity_types = None` scans every user-facing entity, while an empty
//! list constrains to nothing and runs zero queries. Privacy levels apply
//! as a post-filter because filters AND together and a level list is a
//! disjunction.

use chrono::Duration;
use serde::Serialize;

use crate::db::WorkdeskDb;
use crate::nlq::{self, ParsedQuery, PrivacyLevel};
use crate::query::{structured_query, FilterOperator, FilterSpec, QueryError, QueryResult};
use crate::schema::{schema_for, EntityType, FieldType};

#[derive(Debug, Serialize)]
pub struct SearchSection {
    pub entity_type: String,
    pub total_count: usize,
    pub results: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: ParsedQuery,
    pub sections: Vec<SearchSection>,
}

/// Parse free text and run the resulting queries.
pub fn run_search(
    db: &WorkdeskDb,
    text: &str,
    limit: Option<i64>,
) -> Result<SearchResponse, QueryError> {
    run_parsed_search(db, nlq::parse(text), limit)
}

/// Run an already-parsed query. Split out so relative-date parsing can be
/// pinned in tests.
pub fn run_parsed_search(
    db: &WorkdeskDb,
    parsed: ParsedQuery,
    limit: Option<i64>,
) -> Result<SearchResponse, QueryError> {
    // None = no constraint (scan everything); Some([]) = constrain to
    // nothing (run no queries at all).
    let (entities, explicit) = match &parsed.entity_types {
        Some(list) => (list.clone(), true),
        None => (EntityType::USER_FACING.to_vec(), false),
    };

    let mut sections = Vec::new();
    for entity in entities {
        let filters = filters_for(entity, &parsed);
        let result = structured_query(db, entity.as_str(), &filters, None, limit)?;
        let QueryResult::Rows {
            entity_type,
            results,
            ..
        } = result
        else {
            continue;
        };

        let results = apply_privacy(entity, results, parsed.privacy_levels.as_deref());
        // When scanning every entity type, empty sections are noise.
        if results.is_empty() && !explicit {
            continue;
        }
        sections.push(SearchSection {
            entity_type,
            total_count: results.len(),
            results,
        });
    }

    Ok(SearchResponse {
        query: parsed,
        sections,
    })
}

/// Translate the parsed constraints into filter specs for one entity.
fn filters_for(entity: EntityType, parsed: &ParsedQuery) -> Vec<FilterSpec> {
    let schema = schema_for(entity);
    let mut filters = Vec::new();

    if let (Some(field), Some(start), Some(end)) =
        (schema.default_date_field, parsed.start_date, parsed.end_date)
    {
        match schema.scalar_field(field).map(|f| f.field_type) {
            Some(FieldType::Date) => {
                filters.push(spec(field, FilterOperator::Gte, start.to_string()));
                filters.push(spec(field, FilterOperator::Lte, end.to_string()));
            }
            Some(FieldType::Timestamp) => {
                // Inclusive date range over a timestamp column: midnight to
                // midnight-after.
                filters.push(spec(field, FilterOperator::Gte, start.to_string()));
                filters.push(spec(
                    field,
                    FilterOperator::Lt,
                    (end + Duration::days(1)).to_string(),
                ));
            }
            _ => {}
        }
    }

    if let (Some(field), Some(text)) = (schema.search_field, parsed.search_text.as_deref()) {
        filters.push(spec(field, FilterOperator::Contains, text.to_string()));
    }

    filters
}

fn spec(field: &str, operator: FilterOperator, value: String) -> FilterSpec {
    FilterSpec {
        field: field.to_string(),
        operator,
        value: Some(serde_json::Value::String(value)),
    }
}

/// Keep only rows whose privacy level was asked for. Entities without a
/// privacy field are unaffected.
fn apply_privacy(
    entity: EntityType,
    results: Vec<serde_json::Value>,
    levels: Option<&[PrivacyLevel]>,
) -> Vec<serde_json::Value> {
    let Some(levels) = levels else {
        return results;
    };
    if !schema_for(entity).has_privacy_field() {
        return results;
    }
    results
        .into_iter()
        .filter(|row| {
            row.get("privacy")
                .and_then(|v| v.as_str())
                .map(|p| levels.iter().any(|l| l.as_str() == p))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbWorkSession;
    use crate::nlq::parse_with_today;
    use chrono::NaiveDate;

    fn session(id: &str, date: &str, description: &str, privacy: &str) -> DbWorkSession {
        let now = chrono::Utc::now().to_rfc3339();
        DbWorkSession {
            id: id.to_string(),
            project_id: None,
            description: description.to_string(),
            date: date.to_string(),
            start_time: None,
            end_time: None,
            duration_hours: "2.00".to_string(),
            billable: false,
            tags: Vec::new(),
            privacy: privacy.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    #[test]
    fn test_parser_output_is_accepted_by_the_query_engine() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", "2026-03-04", "api refactor", "public"))
            .unwrap();
        db.create_work_session(&session("s2", "2026-02-10", "api refactor", "public"))
            .unwrap();

        let parsed = parse_with_today("show me work sessions today", today());
        let response = run_parsed_search(&db, parsed, None).unwrap();

        assert_eq!(response.sections.len(), 1);
        assert_eq!(response.sections[0].entity_type, "work_session");
        assert_eq!(response.sections[0].total_count, 1);
    }

    #[test]
    fn test_search_text_narrows_within_the_date_range() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", "2026-03-04", "api refactor", "public"))
            .unwrap();
        db.create_work_session(&session("s2", "2026-03-04", "design review", "public"))
            .unwrap();

        let parsed = parse_with_today("find work sessions today refactor", today());
        let response = run_parsed_search(&db, parsed, None).unwrap();
        assert_eq!(response.sections[0].total_count, 1);
        assert_eq!(response.sections[0].results[0]["id"], "s1");
    }

    #[test]
    fn test_none_entity_types_scan_everything() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", "2026-03-04", "api refactor", "public"))
            .unwrap();

        let parsed = parse_with_today("refactor", today());
        assert!(parsed.entity_types.is_none());
        let response = run_parsed_search(&db, parsed, None).unwrap();
        assert_eq!(response.sections.len(), 1);
        assert_eq!(response.sections[0].entity_type, "work_session");
    }

    #[test]
    fn test_empty_entity_list_matches_nothing() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", "2026-03-04", "api refactor", "public"))
            .unwrap();

        let mut parsed = parse_with_today("refactor", today());
        parsed.entity_types = Some(Vec::new());
        let response = run_parsed_search(&db, parsed, None).unwrap();
        assert!(response.sections.is_empty());
    }

    #[test]
    fn test_privacy_levels_post_filter_rows() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1", "2026-03-04", "journaling", "private"))
            .unwrap();
        db.create_work_session(&session("s2", "2026-03-04", "journaling", "public"))
            .unwrap();

        let parsed = parse_with_today("private work sessions today", today());
        let response = run_parsed_search(&db, parsed, None).unwrap();
        assert_eq!(response.sections[0].total_count, 1);
        assert_eq!(response.sections[0].results[0]["id"], "s1");
    }
}
