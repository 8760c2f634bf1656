//! Frame records, choice points and machine status

use super::super::stack::Checkpoint;
use super::code::Opcode;
use serde::Serialize;

/* ===================== Frames ===================== */

/// Frame record for one activation of a binding site
///
/// `offset` is the base slot of the activation: the enclosing frame's offset
/// plus a compiler-supplied delta, `-1` when there is no enclosing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Scope {
    pub id: usize,
    pub offset: i64,
    /// Call site to resume when this frame returns
    pub pc: usize,
}

/* ===================== Choice Points ===================== */

/// Suspended alternative continuation
///
/// The checkpoints are taken when the fork is pushed and are never modified.
#[derive(Debug, Clone, Copy)]
pub struct Fork {
    /// Instruction that created the fork (for tracing)
    pub op: Opcode,
    /// Exact address to resume dispatch at
    pub pc: usize,
    pub stack: Checkpoint,
    pub scopes: Checkpoint,
}

/* ===================== Status ===================== */

/// Where the machine is in the pull protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Loaded, not pulled yet
    Ready,
    /// Dispatching instructions
    Running,
    /// A result was handed to the caller; `pc` is saved for the next pull
    Suspended,
    /// Restoring a choice point
    Backtracking,
    /// Every path is exhausted, or a fatal error aborted evaluation
    Terminated,
}
