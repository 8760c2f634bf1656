//! Tests for choice points and backtracking

use super::helpers::{build_vm, run_program, s};
use crate::executor::{Bytecode, Code, ExecError, Opcode, Status, Stdlib, Val, VmConfig, VM};
use std::sync::Arc;

#[test]
fn test_fork_then_backtrack_emits_literal_once() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::addr(Opcode::Fork, 3),
        Code::op(Opcode::Backtrack),
        Code::push(s("lit")),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(run_program(program, Val::Null), vec![s("lit")]);
}

#[test]
fn test_backtrack_without_fork_falls_through() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::op(Opcode::Backtrack),
        Code::constant(s("after")),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(run_program(program, Val::Null), vec![s("after")]);
}

#[test]
fn test_comma_yields_both_branches_depth_first() {
    // 1, 2
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::addr(Opcode::Fork, 4),
        Code::constant(Val::Int(1)),
        Code::addr(Opcode::Jump, 5),
        Code::constant(Val::Int(2)),
        Code::op(Opcode::Nop),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(
        run_program(program, Val::Null),
        vec![Val::Int(1), Val::Int(2)]
    );
}

#[test]
fn test_forks_resume_newest_first() {
    // 1, (2, 3)
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::addr(Opcode::Fork, 4),
        Code::constant(Val::Int(1)),
        Code::addr(Opcode::Jump, 9),
        Code::addr(Opcode::Fork, 7), // 4
        Code::constant(Val::Int(2)),
        Code::addr(Opcode::Jump, 9),
        Code::constant(Val::Int(3)), // 7
        Code::op(Opcode::Nop),
        Code::op(Opcode::Nop), // 9
        Code::op(Opcode::Ret),
    ];

    assert_eq!(
        run_program(program, s("in")),
        vec![Val::Int(1), Val::Int(2), Val::Int(3)]
    );
}

#[test]
fn test_second_branch_sees_original_input() {
    // (. | "replaced"), .
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::addr(Opcode::Fork, 4),
        Code::constant(s("replaced")),
        Code::addr(Opcode::Jump, 4),
        Code::op(Opcode::Nop),
        Code::op(Opcode::Ret),
    ];

    assert_eq!(
        run_program(program, s("original")),
        vec![s("replaced"), s("original")]
    );
}

#[test]
fn test_pop_fork_restores_extents() {
    let mut vm = build_vm(vec![], Val::Int(0));
    vm.begin_scope(0, 1, 0);
    vm.push(Val::Int(1));
    let stack_len = vm.stack_len();
    let scope_len = vm.scope_len();

    vm.push_fork(Opcode::Fork, 7).unwrap();
    assert_eq!(vm.fork_len(), 1);

    // Mutate well past the checkpoint in both directions
    vm.pop().unwrap();
    vm.pop().unwrap();
    vm.push(s("a"));
    vm.push(s("b"));
    vm.push(s("c"));
    vm.begin_scope(1, 1, 0);
    vm.scopes.pop().unwrap();
    vm.scopes.pop().unwrap();
    assert_eq!(vm.scope_len(), 0);

    let fork = vm.pop_fork().unwrap();
    assert_eq!(fork.pc, 7);
    assert_eq!(vm.status(), Status::Backtracking);
    assert_eq!(vm.fork_len(), 0);
    assert_eq!(vm.stack_len(), stack_len);
    assert_eq!(vm.scope_len(), scope_len);
    assert_eq!(vm.pop().unwrap(), Val::Int(1));
    assert_eq!(vm.pop().unwrap(), Val::Int(0));
    assert_eq!(vm.scope_offset(0).unwrap(), 0);
}

#[test]
fn test_pop_fork_without_forks() {
    let mut vm = build_vm(vec![], Val::Null);
    assert!(vm.pop_fork().is_none());
    assert_eq!(vm.stack_len(), 1);
}

#[test]
fn test_fork_limit_aborts() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::addr(Opcode::Fork, 4),
        Code::addr(Opcode::Fork, 4),
        Code::op(Opcode::Ret),
        Code::op(Opcode::Ret),
    ];
    let config = VmConfig {
        max_forks: Some(1),
        ..VmConfig::default()
    };
    let mut vm = VM::with_config(Arc::new(Stdlib), config);
    vm.execute(Arc::new(Bytecode::new(program)), Val::Null);

    assert!(matches!(vm.next(), Some(Err(ExecError::ForkLimit(1)))));
    assert!(vm.next().is_none());
}

#[test]
fn test_fork_limit_allows_iteration_within_bound() {
    let program = vec![
        Code::frame(Opcode::Scope, 0, 0),
        Code::op(Opcode::Each),
        Code::op(Opcode::Backtrack),
        Code::op(Opcode::Ret),
    ];
    let config = VmConfig {
        max_forks: Some(1),
        ..VmConfig::default()
    };
    let mut vm = VM::with_config(Arc::new(Stdlib), config);
    vm.execute(
        Arc::new(Bytecode::new(program)),
        Val::List(vec![s("x"), s("y"), s("z")]),
    );

    let results: Result<Vec<Val>, ExecError> = vm.collect();
    assert_eq!(results.unwrap(), vec![s("x"), s("y"), s("z")]);
}
