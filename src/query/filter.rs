//! Filter compilation: declarative `FilterSpec`s into parameterized SQL
//! predicates.
//!
//! Each filter's field path is resolved through the schema registry; paths
//! that traverse relationships contribute joins, deduplicated by dotted
//! prefix so a repeated path never multiplies result rows. Filters combine
//! with AND — there is no OR combinator across filters in a single request,
//! mirroring the one-shot query semantics of the tool surface.
//!
//! All value/type checking happens here, before any SQL reaches the store:
//! a literal that cannot be coerced to the terminal field's declared type is
//! a `TypeMismatch`, and an operator applied to an incompatible field type
//! is an `OperatorFieldMismatch`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::ToSql;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::query::QueryError;
use crate::schema::{resolve_path, EntityType, FieldType, JoinHop, ResolvedPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    HasTag,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "EQ",
            FilterOperator::Gt => "GT",
            FilterOperator::Gte => "GTE",
            FilterOperator::Lt => "LT",
            FilterOperator::Lte => "LTE",
            FilterOperator::Contains => "CONTAINS",
            FilterOperator::HasTag => "HAS_TAG",
            FilterOperator::IsNull => "IS_NULL",
            FilterOperator::IsNotNull => "IS_NOT_NULL",
        }
    }

    fn comparison_sql(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            _ => unreachable!("not a comparison operator"),
        }
    }
}

/// One declarative filter. `value` is required for every operator except
/// the null checks, which ignore it entirely even if supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// The AND-combination of all filters in a request: deduplicated joins,
/// predicate fragments, and the bound parameters in `?N` order.
pub struct CompiledFilters {
    pub joins: Vec<JoinHop>,
    pub predicates: Vec<String>,
    pub params: Vec<Box<dyn ToSql>>,
}

impl std::fmt::Debug for CompiledFilters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFilters")
            .field("joins", &self.joins)
            .field("predicates", &self.predicates)
            .field("params", &format_args!("<{} params>", self.params.len()))
            .finish()
    }
}

impl CompiledFilters {
    /// ` WHERE p1 AND p2 ...`, or empty when the filter list was empty
    /// (empty filters = unconstrained, by contract).
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    /// ` JOIN t alias ON ...` for every deduplicated hop, in first-use order.
    pub fn join_clause(&self) -> String {
        self.joins
            .iter()
            .map(|j| format!(" JOIN {} {} ON {}", j.table, j.alias, j.on))
            .collect()
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Next free `?N` slot, for callers appending their own parameters.
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }
}

/// Append hops that aren't already present, keyed by dotted path prefix.
/// Two filters traversing the same prefix share one join.
pub(crate) fn merge_join_hops(existing: &mut Vec<JoinHop>, incoming: &[JoinHop]) {
    for hop in incoming {
        if !existing.iter().any(|j| j.key == hop.key) {
            existing.push(hop.clone());
        }
    }
}

/// Compile a single filter. Equivalent to `compile_filters` with a
/// one-element list.
pub fn compile_filter(
    entity: EntityType,
    spec: &FilterSpec,
) -> Result<CompiledFilters, QueryError> {
    compile_filters(entity, std::slice::from_ref(spec))
}

/// Compile a list of filters into one combined predicate.
pub fn compile_filters(
    entity: EntityType,
    filters: &[FilterSpec],
) -> Result<CompiledFilters, QueryError> {
    let mut compiled = CompiledFilters {
        joins: Vec::new(),
        predicates: Vec::new(),
        params: Vec::new(),
    };

    for spec in filters {
        let resolved = resolve_path(entity, &spec.field)?;
        merge_join_hops(&mut compiled.joins, &resolved.joins);
        let predicate = compile_predicate(&resolved, spec, &mut compiled.params)?;
        compiled.predicates.push(predicate);
    }

    Ok(compiled)
}

fn compile_predicate(
    resolved: &ResolvedPath,
    spec: &FilterSpec,
    params: &mut Vec<Box<dyn ToSql>>,
) -> Result<String, QueryError> {
    let qualified = resolved.qualified();

    match spec.operator {
        FilterOperator::IsNull => return Ok(format!("{qualified} IS NULL")),
        FilterOperator::IsNotNull => return Ok(format!("{qualified} IS NOT NULL")),
        _ => {}
    }

    let value = spec.value.as_ref().ok_or_else(|| QueryError::MissingValue {
        field: spec.field.clone(),
        operator: spec.operator.as_str(),
    })?;

    match spec.operator {
        FilterOperator::Contains => {
            if resolved.field_type != FieldType::String {
                return Err(operator_mismatch(spec, resolved));
            }
            let text = expect_string(&spec.field, value, "string")?;
            params.push(Box::new(text));
            Ok(format!(
                "instr(lower({qualified}), lower(?{})) > 0",
                params.len()
            ))
        }
        FilterOperator::HasTag => {
            if resolved.field_type != FieldType::StringArray {
                return Err(operator_mismatch(spec, resolved));
            }
            let tag = expect_string(&spec.field, value, "string")?;
            params.push(Box::new(tag));
            Ok(format!(
                "EXISTS (SELECT 1 FROM json_each({qualified}) WHERE json_each.value = ?{})",
                params.len()
            ))
        }
        FilterOperator::Eq => {
            if resolved.field_type == FieldType::StringArray {
                return Err(operator_mismatch(spec, resolved));
            }
            params.push(coerce_value(&spec.field, resolved.field_type, value)?);
            Ok(comparison_fragment(resolved, &qualified, "=", params.len()))
        }
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            if !matches!(
                resolved.field_type,
                FieldType::Integer | FieldType::Decimal | FieldType::Date | FieldType::Timestamp
            ) {
                return Err(operator_mismatch(spec, resolved));
            }
            params.push(coerce_value(&spec.field, resolved.field_type, value)?);
            Ok(comparison_fragment(
                resolved,
                &qualified,
                spec.operator.comparison_sql(),
                params.len(),
            ))
        }
        FilterOperator::IsNull | FilterOperator::IsNotNull => unreachable!("handled above"),
    }
}

fn comparison_fragment(
    resolved: &ResolvedPath,
    qualified: &str,
    op: &str,
    param_index: usize,
) -> String {
    // Decimal columns are canonical TEXT; compare numerically so "8.0"
    // and "8.00" are the same value.
    if resolved.field_type == FieldType::Decimal {
        format!("CAST({qualified} AS REAL) {op} CAST(?{param_index} AS REAL)")
    } else {
        format!("{qualified} {op} ?{param_index}")
    }
}

fn operator_mismatch(spec: &FilterSpec, resolved: &ResolvedPath) -> QueryError {
    QueryError::OperatorFieldMismatch {
        field: spec.field.clone(),
        operator: spec.operator.as_str(),
        field_type: resolved.field_type.as_str(),
    }
}

fn expect_string(
    field: &str,
    value: &serde_json::Value,
    expected: &'static str,
) -> Result<String, QueryError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch(field, expected, value))
}

fn type_mismatch(field: &str, expected: &'static str, value: &serde_json::Value) -> QueryError {
    QueryError::TypeMismatch {
        field: field.to_string(),
        expected,
        got: value.to_string(),
    }
}

/// Coerce a JSON literal to the terminal field's declared type. Storage
/// representations: booleans as 0/1, decimals and dates as canonical text,
/// timestamps as RFC 3339 UTC text.
pub(crate) fn coerce_value(
    field: &str,
    field_type: FieldType,
    value: &serde_json::Value,
) -> Result<Box<dyn ToSql>, QueryError> {
    match field_type {
        FieldType::String | FieldType::Enum => {
            Ok(Box::new(expect_string(field, value, "string")?))
        }
        FieldType::Integer => value
            .as_i64()
            .map(|n| Box::new(n) as Box<dyn ToSql>)
            .ok_or_else(|| type_mismatch(field, "integer", value)),
        FieldType::Decimal => {
            let text = match value {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s.trim().to_string(),
                _ => return Err(type_mismatch(field, "decimal", value)),
            };
            let decimal = Decimal::from_str(&text)
                .map_err(|_| type_mismatch(field, "decimal", value))?;
            Ok(Box::new(decimal.to_string()))
        }
        FieldType::Date => {
            let text = expect_string(field, value, "date (YYYY-MM-DD)")?;
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map_err(|_| type_mismatch(field, "date (YYYY-MM-DD)", value))?;
            Ok(Box::new(text))
        }
        FieldType::Timestamp => {
            let text = expect_string(field, value, "RFC 3339 timestamp")?;
            if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
                return Ok(Box::new(ts.with_timezone(&Utc).to_rfc3339()));
            }
            // A bare date constrains a timestamp field from midnight UTC.
            if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
                return Ok(Box::new(
                    DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc).to_rfc3339(),
                ));
            }
            Err(type_mismatch(field, "RFC 3339 timestamp", value))
        }
        FieldType::Boolean => value
            .as_bool()
            .map(|b| Box::new(b) as Box<dyn ToSql>)
            .ok_or_else(|| type_mismatch(field, "boolean", value)),
        FieldType::StringArray => Err(QueryError::OperatorFieldMismatch {
            field: field.to_string(),
            operator: "EQ",
            field_type: FieldType::StringArray.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(field: &str, operator: FilterOperator, value: serde_json::Value) -> FilterSpec {
        FilterSpec {
            field: field.to_string(),
            operator,
            value: Some(value),
        }
    }

    #[test]
    fn test_empty_filter_list_is_unconstrained() {
        let compiled = compile_filters(EntityType::WorkSession, &[]).unwrap();
        assert_eq!(compiled.where_clause(), "");
        assert_eq!(compiled.join_clause(), "");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_repeated_relationship_prefix_joins_once() {
        let filters = vec![
            filter(
                "attendees.person.full_name",
                FilterOperator::Eq,
                json!("Dana Reyes"),
            ),
            filter(
                "attendees.person.company",
                FilterOperator::Contains,
                json!("acme"),
            ),
        ];
        let compiled = compile_filters(EntityType::Meeting, &filters).unwrap();
        // Two filters traverse attendees → person, but each hop joins once.
        assert_eq!(compiled.joins.len(), 2);
        assert_eq!(compiled.joins[0].key, "attendees");
        assert_eq!(compiled.joins[1].key, "attendees.person");
        assert_eq!(compiled.predicates.len(), 2);
    }

    #[test]
    fn test_null_checks_ignore_supplied_value() {
        let spec = FilterSpec {
            field: "on_behalf_of".to_string(),
            operator: FilterOperator::IsNull,
            value: Some(json!("ignored")),
        };
        let compiled = compile_filters(EntityType::ActionItem, &[spec]).unwrap();
        assert_eq!(
            compiled.predicates[0],
            "action_items.on_behalf_of_id IS NULL"
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_has_tag_on_non_array_field_is_rejected() {
        let spec = filter("description", FilterOperator::HasTag, json!("frontend"));
        let err = compile_filters(EntityType::WorkSession, &[spec]).unwrap_err();
        assert!(matches!(err, QueryError::OperatorFieldMismatch { .. }));
    }

    #[test]
    fn test_contains_on_numeric_field_is_rejected() {
        let spec = filter("duration_hours", FilterOperator::Contains, json!("8"));
        let err = compile_filters(EntityType::WorkSession, &[spec]).unwrap_err();
        assert!(matches!(err, QueryError::OperatorFieldMismatch { .. }));
    }

    #[test]
    fn test_non_date_literal_on_date_field_is_type_mismatch() {
        let spec = filter("date", FilterOperator::Gte, json!("next tuesday"));
        let err = compile_filters(EntityType::WorkSession, &[spec]).unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_value_is_rejected_per_operator() {
        let spec = FilterSpec {
            field: "description".to_string(),
            operator: FilterOperator::Contains,
            value: None,
        };
        let err = compile_filters(EntityType::WorkSession, &[spec]).unwrap_err();
        assert!(matches!(err, QueryError::MissingValue { .. }));
    }

    #[test]
    fn test_decimal_comparison_casts_both_sides() {
        let spec = filter("duration_hours", FilterOperator::Gte, json!(6));
        let compiled = compile_filters(EntityType::WorkSession, &[spec]).unwrap();
        assert_eq!(
            compiled.predicates[0],
            "CAST(work_sessions.duration_hours AS REAL) >= CAST(?1 AS REAL)"
        );
    }

    #[test]
    fn test_timestamp_accepts_bare_date() {
        let spec = filter("start_time", FilterOperator::Gte, json!("2026-03-01"));
        let compiled = compile_filters(EntityType::Meeting, &[spec]).unwrap();
        assert_eq!(compiled.params.len(), 1);
        assert_eq!(compiled.predicates[0], "meetings.start_time >= ?1");
    }
}
