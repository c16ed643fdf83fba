//! Coercion of URL tokens and submitted form fields into typed column values.

use crate::config::{ColumnInfo, ColumnType, ResolvedTable};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Marker field sent by every admin form.
pub const SUBMITTED_MARKER: &str = "form.submitted";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse one primary-key token (from a URL segment or a `selected_item` list) as the column's type.
pub fn coerce_token(col: &ColumnInfo, raw: &Value) -> Option<Value> {
    match (col.type_, raw) {
        (_, Value::Null) => None,
        (ColumnType::Integer, Value::Number(n)) => n.as_i64().map(Value::from),
        (ColumnType::Real, Value::Number(n)) => n.as_f64().map(Value::from),
        (ColumnType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
        (ColumnType::Json, v) => Some(v.clone()),
        (_, Value::String(s)) => coerce_text(col.type_, s).ok(),
        _ => None,
    }
}

fn coerce_text(type_: ColumnType, s: &str) -> Result<Value, String> {
    let s_trim = s.trim();
    match type_ {
        ColumnType::Text => Ok(Value::String(s.to_string())),
        ColumnType::Integer => s_trim
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "must be an integer".to_string()),
        ColumnType::Real => s_trim
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| "must be a number".to_string()),
        ColumnType::Boolean => match s_trim.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(Value::Bool(true)),
            "0" | "false" | "off" | "no" | "" => Ok(Value::Bool(false)),
            _ => Err("must be true or false".to_string()),
        },
        ColumnType::Timestamp => parse_timestamp(s_trim)
            .map(|t| Value::String(t.format(TIMESTAMP_FORMAT).to_string()))
            .ok_or_else(|| "must be a date and time".to_string()),
        ColumnType::Date => NaiveDate::parse_from_str(s_trim, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| "must be a date (YYYY-MM-DD)".to_string()),
        ColumnType::Uuid => uuid::Uuid::parse_str(s_trim)
            .map(|u| Value::String(u.to_string()))
            .map_err(|_| "must be a valid UUID".to_string()),
        ColumnType::Json => serde_json::from_str(s_trim).map_err(|_| "must be valid JSON".to_string()),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Coerce one submitted field. `Ok(None)` leaves the column to its database default.
pub fn coerce_form_value(col: &ColumnInfo, raw: &str) -> Result<Option<Value>, String> {
    if raw.trim().is_empty() && col.type_ != ColumnType::Text && col.type_ != ColumnType::Boolean {
        if col.nullable {
            return Ok(Some(Value::Null));
        }
        if col.has_default() {
            return Ok(None);
        }
        return Err("is required".to_string());
    }
    coerce_text(col.type_, raw).map(Some)
}

/// Typed values for every form column present in `fields`; absent columns,
/// booleans included, are left out so a partial post never touches them.
/// The rendered form sends a hidden `0` ahead of each checkbox, and the last
/// occurrence of a field wins, so an unchecked box still arrives as false.
pub fn form_values(table: &ResolvedTable, fields: &[(String, String)]) -> Result<Vec<(String, Value)>, AppError> {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    for col in table.form_columns() {
        let Some(raw) = fields.iter().rev().find(|(k, _)| *k == col.name).map(|(_, v)| v.as_str()) else {
            continue;
        };
        match coerce_form_value(col, raw) {
            Ok(Some(v)) => out.push((col.name.clone(), v)),
            Ok(None) => {}
            Err(msg) => errors.push(format!("{} {}", col.label, msg)),
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(AppError::Validation(errors.join("; ")))
    }
}

pub fn is_submitted(fields: &[(String, String)]) -> bool {
    fields.iter().any(|(k, v)| k == SUBMITTED_MARKER && !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user_table;
    use serde_json::json;

    fn col(type_: ColumnType, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            name: "c".into(),
            label: "c".into(),
            type_,
            primary_key: false,
            nullable,
            default: None,
            references: None,
            validation: None,
        }
    }

    #[test]
    fn tokens_follow_column_type() {
        let int = col(ColumnType::Integer, false);
        assert_eq!(coerce_token(&int, &json!("5")), Some(json!(5)));
        assert_eq!(coerce_token(&int, &json!(5)), Some(json!(5)));
        assert_eq!(coerce_token(&int, &json!("bar")), None);
        let text = col(ColumnType::Text, false);
        assert_eq!(coerce_token(&text, &json!("bar")), Some(json!("bar")));
    }

    #[test]
    fn form_values_coerce_and_report() {
        let t = user_table();
        let fields = vec![
            ("form.submitted".to_string(), "1".to_string()),
            ("name".to_string(), "foo bar".to_string()),
            ("id".to_string(), "99".to_string()),
        ];
        assert_eq!(form_values(&t, &fields).unwrap(), vec![("name".to_string(), json!("foo bar"))]);
        assert!(is_submitted(&fields));
        assert!(!is_submitted(&fields[1..]));
    }

    #[test]
    fn absent_boolean_is_left_alone() {
        let mut t = user_table();
        t.columns.push(col(ColumnType::Boolean, false));
        let name_only = vec![("name".to_string(), "x".to_string())];
        assert_eq!(form_values(&t, &name_only).unwrap(), vec![("name".to_string(), json!("x"))]);

        let unchecked = vec![("c".to_string(), "0".to_string())];
        assert_eq!(form_values(&t, &unchecked).unwrap(), vec![("c".to_string(), json!(false))]);
        let checked = vec![("c".to_string(), "0".to_string()), ("c".to_string(), "1".to_string())];
        assert_eq!(form_values(&t, &checked).unwrap(), vec![("c".to_string(), json!(true))]);
    }

    #[test]
    fn empty_values() {
        assert_eq!(coerce_form_value(&col(ColumnType::Integer, true), ""), Ok(Some(Value::Null)));
        assert!(coerce_form_value(&col(ColumnType::Integer, false), " ").is_err());
        assert_eq!(coerce_form_value(&col(ColumnType::Boolean, false), ""), Ok(Some(json!(false))));
        assert_eq!(
            coerce_form_value(&col(ColumnType::Timestamp, false), "2024-03-01T10:30"),
            Ok(Some(json!("2024-03-01 10:30:00")))
        );
    }
}
