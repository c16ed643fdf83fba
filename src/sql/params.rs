//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::{Database, Type};

/// A value that can be bound to a SQLite query. Converts from serde_json::Value.
#[derive(Clone, Debug)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
}

impl BindValue {
    /// Arrays and objects are stored as their JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::String(v.to_string()),
        }
    }
}

impl<'q> Encode<'q, Sqlite> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        match self {
            BindValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf),
            BindValue::Bool(b) => <bool as Encode<Sqlite>>::encode_by_ref(b, buf),
            BindValue::I64(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            BindValue::F64(n) => <f64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            BindValue::String(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
        }
    }

    fn produces(&self) -> Option<SqliteTypeInfo> {
        Some(match self {
            BindValue::Null | BindValue::String(_) => <String as Type<Sqlite>>::type_info(),
            BindValue::Bool(_) => <bool as Type<Sqlite>>::type_info(),
            BindValue::I64(_) => <i64 as Type<Sqlite>>::type_info(),
            BindValue::F64(_) => <f64 as Type<Sqlite>>::type_info(),
        })
    }
}

impl Type<Sqlite> for BindValue {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_json_values() {
        assert!(matches!(BindValue::from_json(&json!(null)), BindValue::Null));
        assert!(matches!(BindValue::from_json(&json!(3)), BindValue::I64(3)));
        assert!(matches!(BindValue::from_json(&json!(1.5)), BindValue::F64(f) if f == 1.5));
        assert!(matches!(BindValue::from_json(&json!({"a": 1})), BindValue::String(s) if s == r#"{"a":1}"#));
    }
}
