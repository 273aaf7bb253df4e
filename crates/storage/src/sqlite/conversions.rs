//! SQLite value conversion functions.
//!
//! Pure functions for converting between JSON values, query parameters and
//! SQLite values. These are testable in isolation without database access.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use docpersist_core::storage::{bare_parameter_name, Query, StoreError};

/// Convert a JSON value into a SQLite value for parameter binding.
///
/// Booleans bind as integers and nested arrays/objects as JSON text, which is
/// what `json_extract` returns for the same values.
pub fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert query parameters into named SQLite parameters.
///
/// Names keep their `:`, `@` or `$` sigil so they match the predicate text;
/// bare names bind as `:name`.
pub fn query_parameters(query: &Query) -> Result<Vec<(String, SqlValue)>, StoreError> {
    query
        .parameters()
        .iter()
        .map(|(name, value)| Ok((sql_parameter_name(name)?, json_to_sql(value))))
        .collect()
}

fn sql_parameter_name(name: &str) -> Result<String, StoreError> {
    let bare = bare_parameter_name(name);
    if bare.is_empty() || bare.starts_with("__") {
        return Err(StoreError::InvalidQuery(format!(
            "Invalid parameter name: {name}"
        )));
    }
    Ok(if name.starts_with([':', '@', '$']) {
        name.to_string()
    } else {
        format!(":{name}")
    })
}

/// Equality predicate for a match-all query with parameters.
///
/// Each parameter filters the top-level field of the same bare name, so
/// `@stringProperty` matches `body.stringProperty`. Returns `None` when the
/// query has no parameters.
pub fn equality_predicate(query: &Query) -> Result<Option<String>, StoreError> {
    let clauses = query
        .parameters()
        .keys()
        .map(|name| {
            let field = bare_parameter_name(name);
            if !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(StoreError::InvalidQuery(format!(
                    "Parameter {name} does not name a top-level field"
                )));
            }
            Ok(format!(
                "json_extract(body, '$.{field}') = {}",
                sql_parameter_name(name)?
            ))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok((!clauses.is_empty()).then(|| clauses.join(" AND ")))
}

/// Parse a stored document body.
pub fn parse_body(body: &str) -> Result<Value, StoreError> {
    serde_json::from_str(body)
        .map_err(|e| StoreError::Serialization(format!("Stored document is not valid JSON: {e}")))
}
