//! Aggregation compilation and execution: SUM / COUNT / AVG with optional
//! multi-path grouping.
//!
//! The compiled query selects the group-by terminal columns and the raw
//! target column under the combined filter predicate; folding happens here
//! rather than in SQL so decimal-typed fields aggregate with exact decimal
//! arithmetic instead of drifting through REAL. Group order is first-seen
//! row order. SUM over zero rows is zero; AVG over zero rows is null —
//! an inherited asymmetry callers depend on, preserved deliberately.

use std::collections::HashSet;
use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::query::filter::{merge_join_hops, CompiledFilters};
use crate::query::QueryError;
use crate::schema::{resolve_path, schema_for, EntityType, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
        }
    }
}

/// Declarative aggregation request. `group_by` paths resolve and join
/// exactly like filter paths; an empty list means a single scalar result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub function: AggregateFunction,
    pub field: String,
    #[serde(default)]
    pub group_by: Vec<String>,
}

/// A computed aggregate. Integers stay integers; decimals serialize as
/// canonical strings so exactness survives the JSON boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Integer(i64),
    Decimal(Decimal),
    Null,
}

impl Serialize for AggregateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggregateValue::Integer(n) => serializer.serialize_i64(*n),
            AggregateValue::Decimal(d) => serializer.serialize_str(&d.to_string()),
            AggregateValue::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AggregationGroup {
    /// Terminal values of the group-by paths, in the order given.
    pub group_values: Vec<serde_json::Value>,
    pub result: AggregateValue,
}

/// Result shape for an aggregation query: scalar, or grouped with the
/// groups in first-seen order.
#[derive(Debug)]
pub enum AggregationResult {
    Scalar {
        function: AggregateFunction,
        field: String,
        result: AggregateValue,
    },
    Grouped {
        function: AggregateFunction,
        field: String,
        groups: Vec<AggregationGroup>,
        total_groups: usize,
    },
}

impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggregationResult::Scalar {
                function,
                field,
                result,
            } => {
                let mut s = serializer.serialize_struct("AggregationResult", 3)?;
                s.serialize_field("function", function)?;
                s.serialize_field("field", field)?;
                s.serialize_field("result", result)?;
                s.end()
            }
            AggregationResult::Grouped {
                function,
                field,
                groups,
                total_groups,
            } => {
                let mut s = serializer.serialize_struct("AggregationResult", 4)?;
                s.serialize_field("function", function)?;
                s.serialize_field("field", field)?;
                s.serialize_field("groups", groups)?;
                s.serialize_field("total_groups", total_groups)?;
                s.end()
            }
        }
    }
}

/// Compile and execute an aggregation under an already-compiled filter
/// predicate. Joins required by group-by paths merge into the filter's
/// join list, deduplicated by path prefix.
pub fn run_aggregation(
    conn: &Connection,
    entity: EntityType,
    mut base: CompiledFilters,
    spec: &AggregationSpec,
) -> Result<AggregationResult, QueryError> {
    let schema = schema_for(entity);

    let target = resolve_path(entity, &spec.field)?;
    if matches!(spec.function, AggregateFunction::Sum | AggregateFunction::Avg)
        && !target.field_type.is_numeric()
    {
        return Err(QueryError::OperatorFieldMismatch {
            field: spec.field.clone(),
            operator: spec.function.as_str(),
            field_type: target.field_type.as_str(),
        });
    }
    merge_join_hops(&mut base.joins, &target.joins);

    let mut group_columns = Vec::with_capacity(spec.group_by.len());
    for path in &spec.group_by {
        let resolved = resolve_path(entity, path)?;
        merge_join_hops(&mut base.joins, &resolved.joins);
        group_columns.push(resolved);
    }

    // Projection: base row id, the id of the row owning the target column,
    // the group terminals, then the raw target value. The two ids form a
    // fan-out guard: a join introduced only for filtering can emit the same
    // base row several times, and each (base row, target row, group key)
    // must contribute to its group exactly once.
    let mut select_cols = vec![
        format!("{}.id", schema.table),
        format!("{}.id", target.table_alias),
    ];
    for group in &group_columns {
        select_cols.push(group.qualified());
    }
    select_cols.push(target.qualified());

    let sql = format!(
        "SELECT {} FROM {}{}{}",
        select_cols.join(", "),
        schema.table,
        base.join_clause(),
        base.where_clause(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(
        base.params.iter().map(|p| p.as_ref()),
    ))?;

    let group_offset = 2;
    let target_index = group_offset + group_columns.len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut groups: Vec<(Vec<serde_json::Value>, Accumulator)> = Vec::new();
    let mut scalar = Accumulator::new(spec.function, target.field_type);

    while let Some(row) = rows.next()? {
        let base_id: rusqlite::types::Value = row.get(0)?;
        let owner_id: rusqlite::types::Value = row.get(1)?;

        let mut key_values = Vec::with_capacity(group_columns.len());
        for i in 0..group_columns.len() {
            let value: rusqlite::types::Value = row.get(group_offset + i)?;
            key_values.push(sql_value_to_json(value));
        }

        let dedup_key = format!(
            "{}|{}|{}",
            sql_value_to_json(base_id),
            sql_value_to_json(owner_id),
            serde_json::to_string(&key_values).unwrap_or_default()
        );
        if !seen.insert(dedup_key) {
            continue;
        }

        let target_value: rusqlite::types::Value = row.get(target_index)?;
        let numeric = numeric_from_sql(&spec.field, &target_value)?;

        if spec.group_by.is_empty() {
            scalar.feed(numeric);
        } else {
            match groups.iter_mut().find(|(key, _)| *key == key_values) {
                Some((_, acc)) => acc.feed(numeric),
                None => {
                    let mut acc = Accumulator::new(spec.function, target.field_type);
                    acc.feed(numeric);
                    groups.push((key_values, acc));
                }
            }
        }
    }

    if spec.group_by.is_empty() {
        Ok(AggregationResult::Scalar {
            function: spec.function,
            field: spec.field.clone(),
            result: scalar.finish(),
        })
    } else {
        let groups: Vec<AggregationGroup> = groups
            .into_iter()
            .map(|(group_values, acc)| AggregationGroup {
                group_values,
                result: acc.finish(),
            })
            .collect();
        let total_groups = groups.len();
        Ok(AggregationResult::Grouped {
            function: spec.function,
            field: spec.field.clone(),
            groups,
            total_groups,
        })
    }
}

/// Per-group fold state. Sums are exact decimals regardless of field type;
/// integer fields surface back as integers on finish.
struct Accumulator {
    function: AggregateFunction,
    field_type: FieldType,
    sum: Decimal,
    count: i64,
}

impl Accumulator {
    fn new(function: AggregateFunction, field_type: FieldType) -> Self {
        Self {
            function,
            field_type,
            sum: Decimal::ZERO,
            count: 0,
        }
    }

    fn feed(&mut self, value: Option<Decimal>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn finish(self) -> AggregateValue {
        match self.function {
            AggregateFunction::Count => AggregateValue::Integer(self.count),
            AggregateFunction::Sum => {
                if self.field_type == FieldType::Integer {
                    use rust_decimal::prelude::ToPrimitive;
                    AggregateValue::Integer(self.sum.to_i64().unwrap_or(0))
                } else {
                    AggregateValue::Decimal(self.sum)
                }
            }
            AggregateFunction::Avg => {
                if self.count == 0 {
                    AggregateValue::Null
                } else {
                    AggregateValue::Decimal(self.sum / Decimal::from(self.count))
                }
            }
        }
    }
}

/// Read a numeric target cell. SUM/AVG targets were type-checked at compile
/// time, so text cells hold canonical decimals; COUNT accepts any value type
/// and only cares about null-ness, so unparseable text still counts as
/// present.
fn numeric_from_sql(
    field: &str,
    value: &rusqlite::types::Value,
) -> Result<Option<Decimal>, QueryError> {
    use rusqlite::types::Value;
    match value {
        Value::Null => Ok(None),
        Value::Integer(n) => Ok(Some(Decimal::from(*n))),
        Value::Real(f) => Decimal::try_from(*f).map(Some).map_err(|_| {
            QueryError::TypeMismatch {
                field: field.to_string(),
                expected: "decimal",
                got: f.to_string(),
            }
        }),
        Value::Text(s) => match Decimal::from_str(s) {
            Ok(d) => Ok(Some(d)),
            // Non-numeric text under COUNT still counts as present.
            Err(_) => Ok(Some(Decimal::ZERO)),
        },
        Value::Blob(_) => Ok(Some(Decimal::ZERO)),
    }
}

fn sql_value_to_json(value: rusqlite::types::Value) -> serde_json::Value {
    use rusqlite::types::Value;
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(n) => serde_json::Value::from(n),
        Value::Real(f) => serde_json::Value::from(f),
        Value::Text(s) => serde_json::Value::from(s),
        Value::Blob(_) => serde_json::Value::Null,
    }
}
