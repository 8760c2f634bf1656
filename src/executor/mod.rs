//! # Executor - Backtracking Bytecode VM
//!
//! Evaluates a compiled filter against an input value and yields its
//! results one at a time. An expression may produce zero, one or many
//! results; alternatives are explored depth-first through explicit choice
//! points instead of coroutines or threads.
//!
//! ## Core Principles
//!
//! 1. **Pull-driven**: the VM is an `Iterator`. Each pull runs until one
//!    result is produced; nothing runs between pulls.
//! 2. **Checkpointed stacks**: value and scope stacks save and restore in
//!    O(1), and restoring never frees memory, so backtracking reuses it.
//! 3. **Static-chain frames**: each activation addresses its variables at an
//!    offset from its enclosing frame inside one growable slot array.
//! 4. **Two error tiers**: broken bytecode aborts with [`ExecError`]; bad
//!    data flows on as [`Val::Error`].

pub mod errors;
pub mod exec_loop;
pub mod stack;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::{ErrorInfo, ExecError};
pub use exec_loop::run_to_completion;
pub use stdlib::{FunctionTable, Stdlib};
pub use types::{Bytecode, CallTarget, Code, CodeInfo, Opcode, Operand, Status, Val};
pub use vm::{VmConfig, VM};
