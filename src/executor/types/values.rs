//! Runtime value types

use super::super::errors::ErrorInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Runtime value type
///
/// Objects are ordered maps, so iterating one yields values in ascending key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    #[default]
    Null,
    Bool(bool),
    /// Machine integer: program addresses, counters, small literals
    Int(i64),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(BTreeMap<String, Val>),
    /// Error value with code and message
    Error(ErrorInfo),
    /// Remaining elements of an `each` iteration. Internal to the machine.
    #[serde(skip)]
    Cursor(Cursor),
}

/// Position inside a collection that is being iterated
///
/// The elements are shared between every fork that resumes the same
/// iteration, so advancing never copies them.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    items: Arc<[Val]>,
    pos: usize,
}

impl Cursor {
    pub fn new(items: Arc<[Val]>, pos: usize) -> Self {
        Self { items, pos }
    }

    /// Elements not yet produced
    pub fn remaining(&self) -> &[Val] {
        self.items.get(self.pos..).unwrap_or(&[])
    }

    /// Cursor one element further along
    pub fn advance(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            pos: self.pos + 1,
        }
    }
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Val::Null | Val::Bool(false))
    }

    /// Type name as reported in errors and by the `type` builtin
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Int(_) | Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::List(_) | Val::Cursor(_) => "array",
            Val::Obj(_) => "object",
            Val::Error(_) => "error",
        }
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Int(n) => Some(*n as f64),
            Val::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Build a number, collapsing integral floats back into `Int`
    pub fn number(n: f64) -> Val {
        if n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64 {
            Val::Int(n as i64)
        } else {
            Val::Num(n)
        }
    }
}

/* ===================== JSON Conversion ===================== */

impl From<JsonValue> for Val {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Val::Null,
            JsonValue::Bool(b) => Val::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Val::Int(i),
                None => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Val::Str(s),
            JsonValue::Array(items) => Val::List(items.into_iter().map(Val::from).collect()),
            JsonValue::Object(map) => {
                Val::Obj(map.into_iter().map(|(k, v)| (k, Val::from(v))).collect())
            }
        }
    }
}

impl From<Val> for JsonValue {
    fn from(value: Val) -> Self {
        match value {
            Val::Null => JsonValue::Null,
            Val::Bool(b) => JsonValue::Bool(b),
            Val::Int(i) => JsonValue::from(i),
            // NaN and infinities have no JSON form
            Val::Num(n) => serde_json::Number::from_f64(n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Val::Str(s) => JsonValue::String(s),
            Val::List(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Val::Cursor(cursor) => JsonValue::Array(
                cursor
                    .remaining()
                    .iter()
                    .cloned()
                    .map(JsonValue::from)
                    .collect(),
            ),
            Val::Obj(map) => {
                JsonValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Val::Error(err) => serde_json::json!({ "error": err.message, "code": err.code }),
        }
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Val::Error(err) => write!(f, "error({})", err.message),
            other => write!(f, "{}", JsonValue::from(other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Val::Null.is_truthy());
        assert!(!Val::Bool(false).is_truthy());
        assert!(Val::Bool(true).is_truthy());
        assert!(Val::Int(0).is_truthy());
        assert!(Val::Str(String::new()).is_truthy());
        assert!(Val::List(vec![]).is_truthy());
    }

    #[test]
    fn test_json_conversion_keeps_integers() {
        let val = Val::from(json!({"a": [1, 2.5, "x", null]}));
        let Val::Obj(map) = &val else {
            unreachable!("Expected object, got {:?}", val);
        };
        assert_eq!(
            map["a"],
            Val::List(vec![
                Val::Int(1),
                Val::Num(2.5),
                Val::Str("x".to_string()),
                Val::Null
            ])
        );
        assert_eq!(JsonValue::from(val), json!({"a": [1, 2.5, "x", null]}));
    }

    #[test]
    fn test_cursor_remaining() {
        let items: Arc<[Val]> = vec![Val::Int(1), Val::Int(2), Val::Int(3)].into();
        let cursor = Cursor::new(items, 1);
        assert_eq!(cursor.remaining(), &[Val::Int(2), Val::Int(3)]);
        assert_eq!(cursor.advance().advance().remaining(), &[] as &[Val]);
    }

    #[test]
    fn test_number_collapses_integral_floats() {
        assert_eq!(Val::number(4.0), Val::Int(4));
        assert_eq!(Val::number(4.5), Val::Num(4.5));
    }
}
