//! Virtual Machine state
//!
//! The VM holds all execution state for one evaluation:
//! - stack: computation values
//! - scopes: frame records, searched by id for variable addressing
//! - slots: variable storage addressed relative to a frame's offset
//! - forks: choice points waiting to be resumed
//!
//! A VM is pulled like an iterator. Each pull resumes dispatch at the saved
//! `pc` and runs until a result is produced or every path is exhausted.

use super::errors::ExecError;
use super::stack::Stack;
use super::stdlib::FunctionTable;
use super::types::{Bytecode, Fork, Opcode, Scope, Status, Val};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, enabled, trace, Level};

/* ===================== Configuration ===================== */

/// Tuning knobs for a VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Initial block capacity of the value stack
    pub stack_capacity: usize,
    /// Initial number of variable slots
    pub slot_capacity: usize,
    /// Maximum number of pending choice points (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_forks: Option<usize>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: 256,
            slot_capacity: 16,
            max_forks: None,
        }
    }
}

/* ===================== VM ===================== */

/// Virtual Machine state
pub struct VM {
    pub(super) pc: usize,
    pub(super) bytecode: Arc<Bytecode>,
    pub(super) stack: Stack<Val>,
    pub(super) scopes: Stack<Scope>,
    pub(super) slots: Vec<Val>,
    pub(super) forks: Vec<Fork>,
    pub(super) status: Status,
    pub(super) funcs: Arc<dyn FunctionTable>,
    config: VmConfig,
}

impl VM {
    /// Create an idle VM that resolves named calls through `funcs`
    pub fn new(funcs: Arc<dyn FunctionTable>) -> Self {
        Self::with_config(funcs, VmConfig::default())
    }

    pub fn with_config(funcs: Arc<dyn FunctionTable>, config: VmConfig) -> Self {
        VM {
            pc: 0,
            bytecode: Arc::new(Bytecode::default()),
            stack: Stack::with_capacity(config.stack_capacity),
            scopes: Stack::with_capacity(16),
            slots: Vec::with_capacity(config.slot_capacity),
            forks: Vec::new(),
            status: Status::Terminated,
            funcs,
            config,
        }
    }

    /// Load a program and its input
    ///
    /// Any previous evaluation is discarded; allocations are kept for reuse.
    pub fn execute(&mut self, bytecode: Arc<Bytecode>, input: Val) {
        self.pc = 0;
        self.stack.reset();
        self.scopes.reset();
        self.slots.clear();
        self.forks.clear();
        self.bytecode = bytecode;
        self.status = Status::Ready;

        if enabled!(Level::DEBUG) {
            debug!(
                codes = self.bytecode.codes.len(),
                "loaded program\n{}",
                self.bytecode.disassemble()
            );
        }

        self.push(input);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Depth of the value stack
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Depth of the scope stack
    pub fn scope_len(&self) -> usize {
        self.scopes.len()
    }

    /// Number of pending choice points
    pub fn fork_len(&self) -> usize {
        self.forks.len()
    }

    /* ===================== Value Stack ===================== */

    #[inline]
    pub(super) fn push(&mut self, value: Val) {
        self.stack.push(value);
    }

    #[inline]
    pub(super) fn pop(&mut self) -> Result<Val, ExecError> {
        self.stack.pop().ok_or(ExecError::StackUnderflow)
    }

    /// Pop a machine integer for `op`
    pub(super) fn pop_int(&mut self, op: Opcode) -> Result<i64, ExecError> {
        match self.pop()? {
            Val::Int(n) => Ok(n),
            other => Err(ExecError::TypeMismatch {
                op,
                expected: "integer",
                got: other.type_name(),
            }),
        }
    }

    /* ===================== Choice Points ===================== */

    /// Record a choice point resuming at `pc` with the current stack extents
    pub(super) fn push_fork(&mut self, op: Opcode, pc: usize) -> Result<(), ExecError> {
        if let Some(max) = self.config.max_forks {
            if self.forks.len() >= max {
                return Err(ExecError::ForkLimit(max));
            }
        }
        let fork = Fork {
            op,
            pc,
            stack: self.stack.save(),
            scopes: self.scopes.save(),
        };
        self.forks.push(fork);
        trace!(pc, %op, forks = self.forks.len(), ">>> fork");
        Ok(())
    }

    /// Remove the newest choice point and restore its checkpoints
    ///
    /// Leaves the machine `Backtracking` until dispatch resumes.
    pub(super) fn pop_fork(&mut self) -> Option<Fork> {
        let fork = self.forks.pop()?;
        self.status = Status::Backtracking;
        trace!(pc = fork.pc, op = %fork.op, forks = self.forks.len(), "<<< fork");
        self.stack.restore(fork.stack);
        self.scopes.restore(fork.scopes);
        Some(fork)
    }

    /* ===================== Scopes & Slots ===================== */

    /// Base offset of the innermost active frame with id `id`
    pub(super) fn scope_offset(&self, id: usize) -> Result<i64, ExecError> {
        self.scopes
            .lookup(|scope| scope.id == id)
            .map(|scope| scope.offset)
            .ok_or(ExecError::ScopeNotFound { id })
    }

    /// Push a frame for binding site `id`, `delta` slots past the enclosing frame
    pub(super) fn begin_scope(&mut self, id: usize, delta: i64, callpc: usize) {
        let base = self.scopes.top().map_or(-1, |scope| scope.offset);
        self.scopes.push(Scope {
            id,
            offset: base + delta,
            pc: callpc,
        });
    }

    fn slot_index(&self, id: usize, offset: i64) -> Result<usize, ExecError> {
        let index = self.scope_offset(id)? - offset;
        usize::try_from(index).map_err(|_| ExecError::SlotOutOfRange { index })
    }

    pub(super) fn load(&self, id: usize, offset: i64) -> Result<Val, ExecError> {
        let index = self.slot_index(id, offset)?;
        self.slots
            .get(index)
            .cloned()
            .ok_or(ExecError::SlotOutOfRange {
                index: index as i64,
            })
    }

    /// Write a slot, growing the store (doubling, null-filled) as needed
    pub(super) fn store(&mut self, id: usize, offset: i64, value: Val) -> Result<(), ExecError> {
        let index = self.slot_index(id, offset)?;
        if index >= self.slots.len() {
            self.slots.resize((index + 1) * 2, Val::Null);
        }
        self.slots[index] = value;
        Ok(())
    }

    /// Append to the list held in a slot
    pub(super) fn append(&mut self, id: usize, offset: i64, value: Val) -> Result<(), ExecError> {
        let index = self.slot_index(id, offset)?;
        match self.slots.get_mut(index) {
            Some(Val::List(items)) => {
                items.push(value);
                Ok(())
            }
            Some(other) => Err(ExecError::TypeMismatch {
                op: Opcode::Append,
                expected: "array",
                got: other.type_name(),
            }),
            None => Err(ExecError::SlotOutOfRange {
                index: index as i64,
            }),
        }
    }
}

/* ===================== Pull Interface ===================== */

impl Iterator for VM {
    type Item = Result<Val, ExecError>;

    /// Produce the next result
    ///
    /// After the last result, or after a fatal error, every pull returns `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.status == Status::Terminated {
            return None;
        }
        match self.resume() {
            Ok(Some(value)) => {
                self.status = Status::Suspended;
                Some(Ok(value))
            }
            Ok(None) => {
                self.status = Status::Terminated;
                None
            }
            Err(err) => {
                self.status = Status::Terminated;
                Some(Err(err))
            }
        }
    }
}

impl std::fmt::Debug for VM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("pc", &self.pc)
            .field("status", &self.status)
            .field("stack", &self.stack.len())
            .field("scopes", &self.scopes.len())
            .field("forks", &self.forks.len())
            .finish()
    }
}
