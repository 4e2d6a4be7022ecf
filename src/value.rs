use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single CQL-typed value, either bound as a positional parameter or
/// rendered inline as a literal.
///
/// Maps preserve insertion order; the dialect treats map literals as ordered
/// text and reordering pairs would change the compiled statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CqlValue {
    Text(String),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    List(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
    Null,
}

impl CqlValue {
    /// Render this value as an inline CQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled, numerics are
    /// bare, blobs render as `0x...` hex. Collections render recursively:
    /// lists as `[a, b]`, maps as `{k:v, ...}` in insertion order.
    pub fn literal(&self) -> String {
        match self {
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Int(i) => i.to_string(),
            Self::BigInt(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Double(f) => f.to_string(),
            Self::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Self::Blob(bytes) => {
                let mut hex = String::with_capacity(2 + bytes.len() * 2);
                hex.push_str("0x");
                for byte in bytes {
                    let _ = write!(hex, "{:02x}", byte);
                }
                hex
            }
            Self::Uuid(uuid) => uuid.to_string(),
            Self::Timestamp(millis) => millis.to_string(),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(Self::literal).collect();
                format!("[{}]", rendered.join(", "))
            }
            Self::Map(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}:{}", key.literal(), value.literal()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Self::Null => "null".to_string(),
        }
    }

    /// Collection-typed values cannot be bound as positional parameters and
    /// must be inlined by the compiler.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }
}

impl From<serde_json::Value> for CqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::BigInt(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Double(f)
                } else {
                    Self::Null
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (Self::Text(key), value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for CqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for CqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for CqlValue {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}

impl From<f32> for CqlValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for CqlValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for CqlValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Uuid> for CqlValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<DateTime<Utc>> for CqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_doubles_quotes() {
        let value = CqlValue::Text("it's".to_string());
        assert_eq!(value.literal(), "'it''s'");
    }

    #[test]
    fn test_blob_literal_is_hex() {
        let value = CqlValue::Blob(vec![0xde, 0xad, 0x01]);
        assert_eq!(value.literal(), "0xdead01");
    }

    #[test]
    fn test_boolean_and_null_literals() {
        assert_eq!(CqlValue::Boolean(true).literal(), "true");
        assert_eq!(CqlValue::Boolean(false).literal(), "false");
        assert_eq!(CqlValue::Null.literal(), "null");
    }

    #[test]
    fn test_map_literal_preserves_insertion_order() {
        let value = CqlValue::Map(vec![
            (CqlValue::Text("b".to_string()), CqlValue::Int(2)),
            (CqlValue::Text("a".to_string()), CqlValue::Int(1)),
        ]);
        assert_eq!(value.literal(), "{'b':2, 'a':1}");
    }

    #[test]
    fn test_json_number_converts_to_bigint() {
        let value = CqlValue::from(serde_json::json!(42));
        assert_eq!(value, CqlValue::BigInt(42));
    }

    #[test]
    fn test_json_object_preserves_key_order() {
        let value = CqlValue::from(serde_json::json!({"z": 1, "a": "x"}));
        assert_eq!(
            value,
            CqlValue::Map(vec![
                (CqlValue::Text("z".to_string()), CqlValue::BigInt(1)),
                (CqlValue::Text("a".to_string()), CqlValue::Text("x".to_string())),
            ])
        );
    }
}
