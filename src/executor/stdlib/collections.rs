//! Collection and conversion stdlib functions

use super::math;
use crate::executor::errors::{self, ErrorInfo};
use crate::executor::types::Val;
use serde_json::Value as JsonValue;

/// length: element count, character count, absolute value, 0 for null
pub fn length(input: &Val) -> Val {
    match input {
        Val::Null => Val::Int(0),
        Val::Bool(_) | Val::Error(_) => Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_TYPE,
            format!("{} ({}) has no length", input.type_name(), input),
        )),
        Val::Int(n) => Val::Int(n.saturating_abs()),
        Val::Num(n) => Val::number(n.abs()),
        Val::Str(s) => Val::Int(s.chars().count() as i64),
        Val::List(items) => Val::Int(items.len() as i64),
        Val::Cursor(cursor) => Val::Int(cursor.remaining().len() as i64),
        Val::Obj(map) => Val::Int(map.len() as i64),
    }
}

/// keys: sorted object keys, or array indices
pub fn keys(input: &Val) -> Val {
    match input {
        Val::Obj(map) => Val::List(map.keys().cloned().map(Val::Str).collect()),
        Val::List(items) => Val::List((0..items.len() as i64).map(Val::Int).collect()),
        other => Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_TYPE,
            format!("{} ({}) has no keys", other.type_name(), other),
        )),
    }
}

/// add: fold `_plus` over the elements, null for an empty array
pub fn add(input: Val) -> Val {
    let items = match input {
        Val::List(items) => items,
        Val::Obj(map) => map.into_values().collect(),
        other => {
            return Val::Error(ErrorInfo::new(
                errors::WRONG_ARG_TYPE,
                format!("Cannot iterate over {} ({})", other.type_name(), other),
            ))
        }
    };
    let mut acc = Val::Null;
    for item in &items {
        acc = math::plus(&acc, item);
        if matches!(acc, Val::Error(_)) {
            break;
        }
    }
    acc
}

/// has(key): object key or array index membership
pub fn has(input: &Val, key: &Val) -> Val {
    match (input, key) {
        (Val::Obj(map), Val::Str(k)) => Val::Bool(map.contains_key(k)),
        (Val::List(items), Val::Int(i)) => Val::Bool(*i >= 0 && (*i as usize) < items.len()),
        _ => Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_TYPE,
            format!(
                "Cannot check whether {} has a {} key",
                input.type_name(),
                key.type_name()
            ),
        )),
    }
}

/// tostring: strings pass through, everything else is encoded as JSON
pub fn tostring(input: Val) -> Val {
    match input {
        Val::Str(_) => input,
        other => Val::Str(JsonValue::from(other).to_string()),
    }
}

/// error: turn the input into an error value
pub fn error(input: Val) -> Val {
    match input {
        Val::Error(_) => input,
        Val::Str(message) => Val::Error(ErrorInfo::new(errors::USER_ERROR, message)),
        other => Val::Error(ErrorInfo::new(errors::USER_ERROR, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn test_length() {
        assert_eq!(length(&Val::Str("héllo".into())), Val::Int(5));
        assert_eq!(length(&Val::Int(-3)), Val::Int(3));
        assert_eq!(length(&Val::Null), Val::Int(0));
        assert!(matches!(length(&Val::Bool(true)), Val::Error(_)));
    }

    #[test]
    fn test_keys_are_sorted() {
        let obj = Val::Obj(btreemap! {
            "b".to_string() => Val::Int(1),
            "a".to_string() => Val::Int(2),
        });
        assert_eq!(
            keys(&obj),
            Val::List(vec![Val::Str("a".into()), Val::Str("b".into())])
        );
    }

    #[test]
    fn test_add() {
        let list = Val::List(vec![Val::Int(1), Val::Int(2), Val::Num(0.5)]);
        assert_eq!(add(list), Val::Num(3.5));
        assert_eq!(add(Val::List(vec![])), Val::Null);
    }

    #[test]
    fn test_tostring_and_error() {
        assert_eq!(
            tostring(Val::List(vec![Val::Int(1)])),
            Val::Str("[1]".into())
        );
        let Val::Error(err) = error(Val::Str("boom".into())) else {
            unreachable!("Expected error value");
        };
        assert_eq!(err.message, "boom");
    }
}
