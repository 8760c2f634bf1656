//! Numeric stdlib functions and arithmetic operators

use crate::executor::errors::{self, ErrorInfo};
use crate::executor::types::Val;

fn type_error(what: &str, a: &Val, b: &Val) -> Val {
    Val::Error(ErrorInfo::new(
        errors::WRONG_ARG_TYPE,
        format!(
            "{} ({}) and {} ({}) cannot be {}",
            a.type_name(),
            a,
            b.type_name(),
            b,
            what
        ),
    ))
}

/// Apply a float function to a numeric input
pub fn unary(input: &Val, name: &str, f: fn(f64) -> f64) -> Val {
    match input.as_f64() {
        Some(n) => Val::number(f(n)),
        None => Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_TYPE,
            format!("{} ({}) has no {}", input.type_name(), input, name),
        )),
    }
}

pub fn tonumber(input: &Val) -> Val {
    match input {
        Val::Int(_) | Val::Num(_) => input.clone(),
        Val::Str(s) => match s.trim().parse::<f64>() {
            Ok(n) => Val::number(n),
            Err(_) => Val::Error(ErrorInfo::new(
                errors::INVALID_NUMBER,
                format!("Cannot parse {:?} as number", s),
            )),
        },
        other => Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_TYPE,
            format!("{} ({}) cannot be parsed as a number", other.type_name(), other),
        )),
    }
}

/// `a + b`: numbers add, strings and arrays concatenate, objects merge, null is the identity
pub fn plus(a: &Val, b: &Val) -> Val {
    match (a, b) {
        (Val::Null, other) | (other, Val::Null) => other.clone(),
        (Val::Int(x), Val::Int(y)) => match x.checked_add(*y) {
            Some(n) => Val::Int(n),
            None => Val::Num(*x as f64 + *y as f64),
        },
        (Val::Str(x), Val::Str(y)) => Val::Str(format!("{}{}", x, y)),
        (Val::List(x), Val::List(y)) => Val::List(x.iter().chain(y).cloned().collect()),
        (Val::Obj(x), Val::Obj(y)) => {
            let mut merged = x.clone();
            merged.extend(y.iter().map(|(k, v)| (k.clone(), v.clone())));
            Val::Obj(merged)
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Val::number(x + y),
            _ => type_error("added", a, b),
        },
    }
}

/// `a - b`: numbers subtract, arrays remove every element of `b`
pub fn minus(a: &Val, b: &Val) -> Val {
    match (a, b) {
        (Val::Int(x), Val::Int(y)) => match x.checked_sub(*y) {
            Some(n) => Val::Int(n),
            None => Val::Num(*x as f64 - *y as f64),
        },
        (Val::List(x), Val::List(y)) => {
            Val::List(x.iter().filter(|v| !y.contains(v)).cloned().collect())
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Val::number(x - y),
            _ => type_error("subtracted", a, b),
        },
    }
}

pub fn multiply(a: &Val, b: &Val) -> Val {
    match (a, b) {
        (Val::Int(x), Val::Int(y)) => match x.checked_mul(*y) {
            Some(n) => Val::Int(n),
            None => Val::Num(*x as f64 * *y as f64),
        },
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Val::number(x * y),
            _ => type_error("multiplied", a, b),
        },
    }
}

pub fn divide(a: &Val, b: &Val) -> Val {
    match (a.as_f64(), b.as_f64()) {
        (Some(_), Some(y)) if y == 0.0 => Val::Error(ErrorInfo::new(
            errors::DIVISION_BY_ZERO,
            format!("{} and {} cannot be divided because the divisor is zero", a, b),
        )),
        (Some(x), Some(y)) => Val::number(x / y),
        _ => type_error("divided", a, b),
    }
}

/// Integer remainder; operands are truncated first
pub fn modulo(a: &Val, b: &Val) -> Val {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => {
            let (x, y) = (x as i64, y as i64);
            if y == 0 {
                return Val::Error(ErrorInfo::new(
                    errors::DIVISION_BY_ZERO,
                    format!("{} and {} cannot be divided because the divisor is zero", a, b),
                ));
            }
            Val::Int(x.wrapping_rem(y))
        }
        _ => type_error("divided", a, b),
    }
}
