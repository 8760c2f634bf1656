//! Error types for the executor
//!
//! Two tiers:
//! - [`ExecError`]: fatal conditions. The bytecode broke an invariant the
//!   machine relies on, so evaluation stops immediately.
//! - [`ErrorInfo`]: data errors. They travel through the value stack as
//!   [`Val::Error`](super::types::Val::Error) and reach the caller as ordinary results.

use super::types::Opcode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/* ===================== Data Error Codes ===================== */

pub const CANNOT_ITERATE: &str = "CannotIterate";
pub const WRONG_ARG_COUNT: &str = "WrongArgCount";
pub const WRONG_ARG_TYPE: &str = "WrongArgType";
pub const DIVISION_BY_ZERO: &str = "DivisionByZero";
pub const INVALID_NUMBER: &str = "InvalidNumber";
pub const USER_ERROR: &str = "UserError";

/* ===================== Data Errors ===================== */

/// Error value carried on the stack like any other value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/* ===================== Fatal Errors ===================== */

/// Fatal executor error
///
/// Every variant points at a compiler or bytecode defect, never at bad user data.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("no scope with id {id} is active")]
    ScopeNotFound { id: usize },

    #[error("variable slot {index} is out of range")]
    SlotOutOfRange { index: i64 },

    #[error("{op}: expected {expected}, got {got}")]
    TypeMismatch {
        op: Opcode,
        expected: &'static str,
        got: &'static str,
    },

    #[error("invalid operand for {op} at pc {pc}")]
    InvalidOperand { pc: usize, op: Opcode },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("unknown opcode: 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("fork limit of {0} exceeded")]
    ForkLimit(usize),

    #[error("invalid bytecode: {0}")]
    Decode(#[from] serde_json::Error),
}
