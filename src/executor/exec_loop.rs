//! Core execution loop
//!
//! This module contains `resume()`, the heart of the interpreter. It fetches,
//! dispatches and executes instructions until one path produces a result or
//! every path is exhausted.
//!
//! ## Function Organization
//! 1. run_to_completion() - Top-level driver (pulls every result)
//! 2. resume() - Main execution loop with backtracking
//! 3. each() - Collection iteration, the only instruction that forks implicitly

use super::errors::{self, ErrorInfo, ExecError};
use super::types::{CallTarget, Code, Cursor, Opcode, Operand, Status, Val};
use super::vm::VM;
use std::sync::Arc;
use tracing::trace;

/* ===================== Public API ===================== */

/// Pull every remaining result from the VM
///
/// Stops at the first fatal error.
pub fn run_to_completion(vm: &mut VM) -> Result<Vec<Val>, ExecError> {
    vm.by_ref().collect()
}

/* ===================== Dispatch ===================== */

impl VM {
    /// Run from the saved `pc` until a result is produced
    ///
    /// Returns `Ok(None)` once no path and no choice point remains.
    pub(super) fn resume(&mut self) -> Result<Option<Val>, ExecError> {
        let bytecode = Arc::clone(&self.bytecode);
        let codes = &bytecode.codes;
        let mut pc = self.pc;
        let mut callpc = 0;

        loop {
            self.status = Status::Running;

            'dispatch: while pc < codes.len() {
                let code = &codes[pc];
                trace!(pc, %code, stack = self.stack.len(), "step");

                match code.op {
                    Opcode::Nop => {}

                    Opcode::Push => self.push(literal(code, pc)?.clone()),

                    Opcode::Pop => {
                        self.pop()?;
                    }

                    Opcode::Dup => {
                        let x = self.pop()?;
                        self.push(x.clone());
                        self.push(x);
                    }

                    Opcode::Swap => {
                        let x = self.pop()?;
                        let y = self.pop()?;
                        self.push(x);
                        self.push(y);
                    }

                    Opcode::Const => {
                        self.pop()?;
                        self.push(literal(code, pc)?.clone());
                    }

                    Opcode::Lt => {
                        let b = self.pop_int(code.op)?;
                        let a = self.pop_int(code.op)?;
                        self.push(Val::Bool(a < b));
                    }

                    Opcode::Incr => {
                        let n = self.pop_int(code.op)?;
                        self.push(Val::Int(n.wrapping_add(1)));
                    }

                    Opcode::Load => {
                        let (id, offset) = frame(code, pc)?;
                        let value = self.load(id, offset)?;
                        self.push(value);
                    }

                    Opcode::Store => {
                        let (id, offset) = frame(code, pc)?;
                        let value = self.pop()?;
                        self.store(id, offset, value)?;
                    }

                    Opcode::Fork => {
                        let target = addr(code, pc)?;
                        self.push_fork(code.op, target)?;
                    }

                    Opcode::Backtrack => {
                        if !self.forks.is_empty() {
                            pc += 1;
                            break 'dispatch;
                        }
                    }

                    Opcode::Jump => pc = addr(code, pc)?,

                    Opcode::JumpPop => {
                        let target = self.pop_int(code.op)?;
                        callpc = pc;
                        pc = usize::try_from(target).map_err(|_| invalid(code, pc))?;
                    }

                    Opcode::JumpIfNot => {
                        let target = addr(code, pc)?;
                        if !self.pop()?.is_truthy() {
                            pc = target;
                        }
                    }

                    Opcode::Ret => {
                        let scope = self.scopes.pop().ok_or(ExecError::StackUnderflow)?;
                        pc = scope.pc;
                        if self.scopes.is_empty() {
                            pc = codes.len();
                            if self.stack.is_empty() {
                                // Nothing to emit on this path
                                break 'dispatch;
                            }
                            self.pc = pc;
                            return self.pop().map(Some);
                        }
                    }

                    Opcode::Call => match &code.v {
                        Operand::Call(CallTarget::Addr { pc: target }) => {
                            callpc = pc;
                            pc = *target;
                        }
                        Operand::Call(CallTarget::Named { name, argc }) => {
                            let input = self.pop()?;
                            let mut args = Vec::with_capacity(*argc);
                            for _ in 0..*argc {
                                args.push(self.pop()?);
                            }
                            let result = self
                                .funcs
                                .call(name, input, args)
                                .ok_or_else(|| ExecError::UnknownFunction(name.clone()))?;
                            self.push(result);
                        }
                        _ => return Err(invalid(code, pc)),
                    },

                    Opcode::Scope => {
                        let (id, delta) = frame(code, pc)?;
                        self.begin_scope(id, delta, callpc);
                    }

                    Opcode::Append => {
                        let (id, offset) = frame(code, pc)?;
                        let value = self.pop()?;
                        self.append(id, offset, value)?;
                    }

                    Opcode::Each => {
                        if self.each(pc)? {
                            // Skip the empty-collection handler
                            pc += 1;
                        }
                    }
                }

                pc += 1;
            }

            self.pc = pc;
            match self.pop_fork() {
                Some(fork) => pc = fork.pc,
                None => return Ok(None),
            }
        }
    }

    /// Take one element from the collection on top of the stack
    ///
    /// When more elements remain, a fork resuming at this same instruction
    /// holds a cursor over the rest. Returns `false` for an empty collection.
    fn each(&mut self, pc: usize) -> Result<bool, ExecError> {
        let cursor = match self.pop()? {
            Val::List(items) => Cursor::new(items.into(), 0),
            Val::Obj(map) => Cursor::new(map.into_values().collect(), 0),
            Val::Cursor(cursor) => cursor,
            other => {
                // Counts as a produced element, so the empty-collection
                // handler is skipped and the error reaches the caller
                self.push(Val::Error(ErrorInfo::new(
                    errors::CANNOT_ITERATE,
                    format!("Cannot iterate over {} ({})", other.type_name(), other),
                )));
                return Ok(true);
            }
        };

        let Some(first) = cursor.remaining().first().cloned() else {
            return Ok(false);
        };
        if cursor.remaining().len() > 1 {
            self.push(Val::Cursor(cursor.advance()));
            self.push_fork(Opcode::Each, pc)?;
            self.pop()?;
        }
        self.push(first);
        Ok(true)
    }
}

/* ===================== Operand Access ===================== */

fn invalid(code: &Code, pc: usize) -> ExecError {
    ExecError::InvalidOperand { pc, op: code.op }
}

fn literal(code: &Code, pc: usize) -> Result<&Val, ExecError> {
    match &code.v {
        Operand::Value(v) => Ok(v),
        _ => Err(invalid(code, pc)),
    }
}

fn addr(code: &Code, pc: usize) -> Result<usize, ExecError> {
    match code.v {
        Operand::Addr(target) => Ok(target),
        _ => Err(invalid(code, pc)),
    }
}

fn frame(code: &Code, pc: usize) -> Result<(usize, i64), ExecError> {
    match code.v {
        Operand::Frame { id, offset } => Ok((id, offset)),
        _ => Err(invalid(code, pc)),
    }
}
