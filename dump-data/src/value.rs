use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed bind value.
///
/// Entities expose their columns as `Value`s so the engine can build filters,
/// inserts and partial updates without knowing the concrete struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this is the zero value of its type.
    ///
    /// Zero values are skipped when an entity is used as an equality template.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Column → value equality filter. `Null` values match with `IS NULL`.
pub type FilterMap = BTreeMap<String, Value>;

/// Build a [`FilterMap`] from `column => value` pairs.
///
/// ```ignore
/// let filter = filter_map! { "user_id" => 7, "status" => 1 };
/// ```
#[macro_export]
macro_rules! filter_map {
    () => { $crate::FilterMap::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::FilterMap::new();
        $( map.insert(::std::string::String::from($column), $crate::Value::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(Value::from(0i64).is_zero());
        assert!(Value::from("").is_zero());
        assert!(Value::from(None::<String>).is_zero());
        assert!(!Value::from(3i32).is_zero());
        assert!(!Value::from("alice").is_zero());
        assert!(!Value::from(true).is_zero());
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 7, 1.5, "x", true]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Int(7),
                Value::Float(1.5),
                Value::Text("x".into()),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_filter_map_macro() {
        let map = filter_map! { "user_id" => 7, "name" => "bob" };
        assert_eq!(map.get("user_id"), Some(&Value::Int(7)));
        assert_eq!(map.get("name"), Some(&Value::Text("bob".into())));
    }
}
