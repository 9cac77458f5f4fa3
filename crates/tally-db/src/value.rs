//! Conversions between JSON values and SQLite values.

use rusqlite::types::{Value, ValueRef};
use serde_json::{Number, Value as JsonValue};

use crate::{
    error::{DbError, Result},
    schema::ColumnType,
};

/// A result row (or mutation payload) keyed by output column name, in column order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Converts a JSON operand into a bindable SQLite value.
///
/// Booleans bind as 0/1. Lists and objects have no column representation.
pub(crate) fn to_sql_value(column: &str, value: &JsonValue) -> Result<Value> {
    let value = match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(int) => Value::Integer(int),
            None => Value::Real(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(text) => Value::Text(text.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            return Err(DbError::Validation(format!(
                "Column `{column}` cannot hold a list or an object"
            )));
        }
    };
    Ok(value)
}

/// Converts a fetched SQLite value into JSON, using the column's declared type.
pub(crate) fn from_sql_value(value: ValueRef<'_>, ty: ColumnType) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(int) if ty == ColumnType::Boolean => JsonValue::Bool(int != 0),
        ValueRef::Integer(int) => JsonValue::from(int),
        ValueRef::Real(real) => Number::from_f64(real)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value("c", &json!(true)).unwrap(), Value::Integer(1));
        assert_eq!(to_sql_value("c", &json!(false)).unwrap(), Value::Integer(0));
        assert_eq!(to_sql_value("c", &json!(42)).unwrap(), Value::Integer(42));
        assert_eq!(to_sql_value("c", &json!(1.5)).unwrap(), Value::Real(1.5));
        assert_eq!(
            to_sql_value("c", &json!("x")).unwrap(),
            Value::Text("x".to_string())
        );
        assert_eq!(to_sql_value("c", &JsonValue::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_to_sql_value_rejects_compound() {
        let err = to_sql_value("content", &json!({ "a": 1 })).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(to_sql_value("content", &json!([1])).is_err());
    }

    #[test]
    fn test_from_sql_value() {
        assert_eq!(
            from_sql_value(ValueRef::Integer(1), ColumnType::Boolean),
            json!(true)
        );
        assert_eq!(
            from_sql_value(ValueRef::Integer(0), ColumnType::Boolean),
            json!(false)
        );
        assert_eq!(
            from_sql_value(ValueRef::Integer(1700000000), ColumnType::Timestamp),
            json!(1700000000)
        );
        assert_eq!(
            from_sql_value(ValueRef::Text(b"Printer 1"), ColumnType::Text),
            json!("Printer 1")
        );
        assert_eq!(
            from_sql_value(ValueRef::Null, ColumnType::Boolean),
            JsonValue::Null
        );
    }
}
