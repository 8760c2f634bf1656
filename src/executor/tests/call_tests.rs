//! Tests for calls: static addresses, dynamic addresses and named functions

use super::helpers::{build_vm, ints, run_json, run_program, s};
use crate::executor::{errors, Bytecode, Code, ErrorInfo, Opcode, Val, VM};
use std::sync::Arc;

#[test]
fn test_static_call_returns_to_call_site() {
    // def f: . + 1; 41 | f
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::constant(Val::Int(41)),
        Code::call(3),
        Code::op(Opcode::Ret),
        Code::frame(Opcode::Scope, 1, 0), // 4: f
        Code::op(Opcode::Incr),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(run_program(program, Val::Null), vec![Val::Int(42)]);
}

#[test]
fn test_jump_pop_records_return_address() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::constant(Val::Int(41)),
        Code::push(Val::Int(4)),
        Code::op(Opcode::JumpPop),
        Code::op(Opcode::Ret),
        Code::frame(Opcode::Scope, 1, 0), // 5: closure body
        Code::op(Opcode::Incr),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(run_program(program, Val::Null), vec![Val::Int(42)]);
}

#[test]
fn test_call_inside_iteration() {
    // def f: . + 1; .[] | f
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::op(Opcode::Each),
        Code::op(Opcode::Backtrack),
        Code::call(5),
        Code::op(Opcode::Ret),
        Code::op(Opcode::Nop),
        Code::frame(Opcode::Scope, 1, 0), // 6: f
        Code::op(Opcode::Incr),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(
        run_program(program, ints(&[1, 2, 3])),
        vec![Val::Int(2), Val::Int(3), Val::Int(4)]
    );
}

#[test]
fn test_named_call_on_input() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::call_named("length", 0),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(run_program(program, ints(&[4, 5, 6])), vec![Val::Int(3)]);
}

#[test]
fn test_named_call_argument_order() {
    // Arguments sit beneath the primary input: first argument nearest the top
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::push(Val::Int(3)),
        Code::push(Val::Int(4)),
        Code::push(Val::Null),
        Code::call_named("_minus", 2),
        Code::op(Opcode::Ret),
    ];
    let mut vm = build_vm(program, Val::Int(10));

    assert_eq!(vm.next().unwrap().unwrap(), Val::Int(1));
    // The input is still beneath the result
    assert_eq!(vm.stack_len(), 1);
}

#[test]
fn test_named_call_error_value_is_a_result() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::call_named("error", 0),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(
        run_program(program, s("boom")),
        vec![Val::Error(ErrorInfo::new(errors::USER_ERROR, "boom"))]
    );
}

#[test]
fn test_named_call_wrong_arg_count_is_data_error() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::push(Val::Int(0)),
        Code::call_named("length", 1),
        Code::op(Opcode::Ret),
    ];
    let results = run_program(program, s("in"));

    let [Val::Error(err)] = results.as_slice() else {
        panic!("Expected one error value, got {:?}", results);
    };
    assert_eq!(err.code, errors::WRONG_ARG_COUNT);
}

#[test]
fn test_custom_function_table() {
    let table = |name: &str, input: Val, args: Vec<Val>| match name {
        "pair" => Some(Val::List(vec![input, args.into_iter().next()?])),
        _ => None,
    };
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::push(s("arg")),
        Code::push(s("primary")),
        Code::call_named("pair", 1),
        Code::op(Opcode::Ret),
    ];
    let mut vm = VM::new(Arc::new(table));
    vm.execute(Arc::new(Bytecode::new(program)), Val::Null);

    assert_eq!(
        vm.next().unwrap().unwrap(),
        Val::List(vec![s("primary"), s("arg")])
    );
    assert!(vm.next().is_none());
}

#[test]
fn test_program_from_json() {
    let source = r#"{
        "codes": [
            {"op": "scope", "v": {"t": "Frame", "v": {"id": 0, "offset": 0}}},
            {"op": "each"},
            {"op": "backtrack"},
            {"op": "push", "v": {"t": "Value", "v": {"t": "Int", "v": 10}}},
            {"op": "swap"},
            {"op": "push", "v": {"t": "Value", "v": {"t": "Null"}}},
            {"op": "call", "v": {"t": "Call", "v": {"t": "Named", "name": "_multiply", "argc": 2}}},
            {"op": "ret"}
        ],
        "infos": [{"name": "main", "pc": 0}]
    }"#;

    assert_eq!(
        run_json(source, ints(&[1, 2])).unwrap(),
        vec![Val::Int(10), Val::Int(20)]
    );
}
