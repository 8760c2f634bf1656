//! Standard library function implementations
//!
//! Named `call` instructions are resolved through a [`FunctionTable`]. The VM
//! only knows the trait; [`Stdlib`] is the table the CLI installs.
//!
//! Builtins never fail fatally. Bad arguments come back as `Val::Error`.

pub mod collections;
pub mod compare;
pub mod math;

use super::errors::{self, ErrorInfo};
use super::types::Val;

/* ===================== Function Table ===================== */

/// External table of named functions
pub trait FunctionTable: Send + Sync {
    /// Call `name` with a primary input and ordered arguments
    ///
    /// Returns `None` if the table has no function called `name`.
    fn call(&self, name: &str, input: Val, args: Vec<Val>) -> Option<Val>;
}

impl<F> FunctionTable for F
where
    F: Fn(&str, Val, Vec<Val>) -> Option<Val> + Send + Sync,
{
    fn call(&self, name: &str, input: Val, args: Vec<Val>) -> Option<Val> {
        self(name, input, args)
    }
}

/* ===================== Standard Library Function Types ===================== */

/// Standard library function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdlibFunc {
    Length,
    Type,
    Keys,
    Add,
    Has,
    ToString,
    ToNumber,
    Not,
    Error,
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl StdlibFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "length" => StdlibFunc::Length,
            "type" => StdlibFunc::Type,
            "keys" => StdlibFunc::Keys,
            "add" => StdlibFunc::Add,
            "has" => StdlibFunc::Has,
            "tostring" => StdlibFunc::ToString,
            "tonumber" => StdlibFunc::ToNumber,
            "not" => StdlibFunc::Not,
            "error" => StdlibFunc::Error,
            "floor" => StdlibFunc::Floor,
            "ceil" => StdlibFunc::Ceil,
            "round" => StdlibFunc::Round,
            "abs" => StdlibFunc::Abs,
            "sqrt" => StdlibFunc::Sqrt,
            "_plus" => StdlibFunc::Plus,
            "_minus" => StdlibFunc::Minus,
            "_multiply" => StdlibFunc::Multiply,
            "_divide" => StdlibFunc::Divide,
            "_modulo" => StdlibFunc::Modulo,
            "_equal" => StdlibFunc::Equal,
            "_notequal" => StdlibFunc::NotEqual,
            "_less" => StdlibFunc::Less,
            "_greater" => StdlibFunc::Greater,
            "_lesseq" => StdlibFunc::LessEq,
            "_greatereq" => StdlibFunc::GreaterEq,
            _ => return None,
        };
        Some(func)
    }

    /// Number of arguments besides the primary input
    pub fn arity(self) -> usize {
        match self {
            StdlibFunc::Has => 1,
            StdlibFunc::Plus
            | StdlibFunc::Minus
            | StdlibFunc::Multiply
            | StdlibFunc::Divide
            | StdlibFunc::Modulo
            | StdlibFunc::Equal
            | StdlibFunc::NotEqual
            | StdlibFunc::Less
            | StdlibFunc::Greater
            | StdlibFunc::LessEq
            | StdlibFunc::GreaterEq => 2,
            _ => 0,
        }
    }
}

/* ===================== Stdlib Dispatcher ===================== */

/// Call a standard library function
///
/// Binary operators take their operands from `args` as `[lhs, rhs]`; the
/// primary input is ignored.
pub fn call_stdlib_func(func: StdlibFunc, input: Val, args: Vec<Val>) -> Val {
    if args.len() != func.arity() {
        return Val::Error(ErrorInfo::new(
            errors::WRONG_ARG_COUNT,
            format!(
                "{:?} expects {} argument(s), got {}",
                func,
                func.arity(),
                args.len()
            ),
        ));
    }

    match func {
        StdlibFunc::Length => collections::length(&input),
        StdlibFunc::Type => Val::Str(input.type_name().to_string()),
        StdlibFunc::Keys => collections::keys(&input),
        StdlibFunc::Add => collections::add(input),
        StdlibFunc::Has => collections::has(&input, &args[0]),
        StdlibFunc::ToString => collections::tostring(input),
        StdlibFunc::ToNumber => math::tonumber(&input),
        StdlibFunc::Not => Val::Bool(!input.is_truthy()),
        StdlibFunc::Error => collections::error(input),
        StdlibFunc::Floor => math::unary(&input, "floor", f64::floor),
        StdlibFunc::Ceil => math::unary(&input, "ceil", f64::ceil),
        StdlibFunc::Round => math::unary(&input, "round", f64::round),
        StdlibFunc::Abs => math::unary(&input, "abs", f64::abs),
        StdlibFunc::Sqrt => math::unary(&input, "sqrt", f64::sqrt),
        StdlibFunc::Plus => math::plus(&args[0], &args[1]),
        StdlibFunc::Minus => math::minus(&args[0], &args[1]),
        StdlibFunc::Multiply => math::multiply(&args[0], &args[1]),
        StdlibFunc::Divide => math::divide(&args[0], &args[1]),
        StdlibFunc::Modulo => math::modulo(&args[0], &args[1]),
        StdlibFunc::Equal => Val::Bool(compare::compare(&args[0], &args[1]).is_eq()),
        StdlibFunc::NotEqual => Val::Bool(compare::compare(&args[0], &args[1]).is_ne()),
        StdlibFunc::Less => Val::Bool(compare::compare(&args[0], &args[1]).is_lt()),
        StdlibFunc::Greater => Val::Bool(compare::compare(&args[0], &args[1]).is_gt()),
        StdlibFunc::LessEq => Val::Bool(compare::compare(&args[0], &args[1]).is_le()),
        StdlibFunc::GreaterEq => Val::Bool(compare::compare(&args[0], &args[1]).is_ge()),
    }
}

/// Default function table
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdlib;

impl FunctionTable for Stdlib {
    fn call(&self, name: &str, input: Val, args: Vec<Val>) -> Option<Val> {
        StdlibFunc::from_name(name).map(|func| call_stdlib_func(func, input, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_is_not_in_table() {
        assert_eq!(Stdlib.call("frobnicate", Val::Null, vec![]), None);
    }

    #[test]
    fn test_wrong_arg_count_is_data_error() {
        let result = Stdlib.call("has", Val::Null, vec![]).unwrap();
        let Val::Error(err) = result else {
            unreachable!("Expected error value, got {:?}", result);
        };
        assert_eq!(err.code, errors::WRONG_ARG_COUNT);
    }

    #[test]
    fn test_closures_are_function_tables() {
        let table = |name: &str, input: Val, _args: Vec<Val>| match name {
            "id" => Some(input),
            _ => None,
        };
        assert_eq!(
            FunctionTable::call(&table, "id", Val::Int(3), vec![]),
            Some(Val::Int(3))
        );
        assert_eq!(FunctionTable::call(&table, "other", Val::Int(3), vec![]), None);
    }

    #[test]
    fn test_comparisons() {
        let lt = Stdlib
            .call("_less", Val::Null, vec![Val::Int(1), Val::Num(1.5)])
            .unwrap();
        assert_eq!(lt, Val::Bool(true));

        let eq = Stdlib
            .call("_equal", Val::Null, vec![Val::Int(2), Val::Num(2.0)])
            .unwrap();
        assert_eq!(eq, Val::Bool(true));
    }
}
