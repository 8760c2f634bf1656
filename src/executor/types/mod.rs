//! Type definitions for the executor
//!
//! - Instructions and programs (Opcode, Operand, Code, Bytecode)
//! - Runtime values (Val)
//! - Frames, choice points and machine status

pub mod code;
pub mod control;
pub mod values;

// Re-export all types for convenient access
pub use code::{Bytecode, CallTarget, Code, CodeInfo, Opcode, Operand};
pub use control::{Fork, Scope, Status};
pub use values::{Cursor, Val};
