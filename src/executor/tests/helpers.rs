//! Test helpers for executor tests
//!
//! Common utilities for building programs and pulling their results

use crate::executor::{run_to_completion, Bytecode, Code, ExecError, Stdlib, Val, VM};
use std::sync::Arc;

/// Load `codes` into a fresh VM with the standard library and `input`
pub fn build_vm(codes: Vec<Code>, input: Val) -> VM {
    let mut vm = VM::new(Arc::new(Stdlib));
    vm.execute(Arc::new(Bytecode::new(codes)), input);
    vm
}

/// Run a program to completion, panicking on a fatal error
pub fn run_program(codes: Vec<Code>, input: Val) -> Vec<Val> {
    let mut vm = build_vm(codes, input);
    run_to_completion(&mut vm).expect("Program aborted")
}

/// Load a JSON program and run it to completion
pub fn run_json(program_json: &str, input: Val) -> Result<Vec<Val>, ExecError> {
    let bytecode = Bytecode::from_json(program_json)?;
    let mut vm = VM::new(Arc::new(Stdlib));
    vm.execute(Arc::new(bytecode), input);
    run_to_completion(&mut vm)
}

pub fn s(v: &str) -> Val {
    Val::Str(v.to_string())
}

pub fn ints(items: &[i64]) -> Val {
    Val::List(items.iter().copied().map(Val::Int).collect())
}
