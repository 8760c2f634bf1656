//! Bytecode instruction types
//!
//! A program is an immutable list of [`Code`]s plus per-instruction
//! [`CodeInfo`] used only for disassembly and tracing.
//!
//! ## Addressing
//!
//! The loop advances `pc` by one after every instruction. `jump`, `jumpifnot`,
//! `jumppop`, static `call` and `ret` all land on the address *before* the
//! next instruction to run. Fork resume points are exact.

use super::super::errors::ExecError;
use super::values::Val;
use serde::{Deserialize, Serialize};

/* ===================== Opcodes ===================== */

/// Instruction opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    /// Push the literal operand
    Push = 1,
    Pop = 2,
    Dup = 3,
    Swap = 4,
    /// Replace the top of the stack with the literal operand
    Const = 5,
    /// Integer less-than: pop b, pop a, push a < b
    Lt = 6,
    /// Integer increment
    Incr = 7,
    Load = 8,
    Store = 9,
    /// Record a choice point resuming at the operand address
    Fork = 10,
    /// Abandon the current path if a choice point exists
    Backtrack = 11,
    Jump = 12,
    /// Pop an address and jump to it, remembering the call site
    JumpPop = 13,
    JumpIfNot = 14,
    Ret = 15,
    Call = 16,
    /// Push a frame record for a binding site
    Scope = 17,
    /// Append the top of the stack to the list in a variable slot
    Append = 18,
    /// Iterate a list or object, one element per path
    Each = 19,
}

impl Opcode {
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Dup => "dup",
            Opcode::Swap => "swap",
            Opcode::Const => "const",
            Opcode::Lt => "lt",
            Opcode::Incr => "incr",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Fork => "fork",
            Opcode::Backtrack => "backtrack",
            Opcode::Jump => "jump",
            Opcode::JumpPop => "jump_pop",
            Opcode::JumpIfNot => "jump_if_not",
            Opcode::Ret => "ret",
            Opcode::Call => "call",
            Opcode::Scope => "scope",
            Opcode::Append => "append",
            Opcode::Each => "each",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ExecError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let op = match byte {
            0 => Opcode::Nop,
            1 => Opcode::Push,
            2 => Opcode::Pop,
            3 => Opcode::Dup,
            4 => Opcode::Swap,
            5 => Opcode::Const,
            6 => Opcode::Lt,
            7 => Opcode::Incr,
            8 => Opcode::Load,
            9 => Opcode::Store,
            10 => Opcode::Fork,
            11 => Opcode::Backtrack,
            12 => Opcode::Jump,
            13 => Opcode::JumpPop,
            14 => Opcode::JumpIfNot,
            15 => Opcode::Ret,
            16 => Opcode::Call,
            17 => Opcode::Scope,
            18 => Opcode::Append,
            19 => Opcode::Each,
            other => return Err(ExecError::UnknownOpcode(other)),
        };
        Ok(op)
    }
}

/* ===================== Operands ===================== */

/// Target of a `call` instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum CallTarget {
    /// Compiled function body
    Addr { pc: usize },
    /// Builtin resolved through the function table
    Named { name: String, argc: usize },
}

/// Instruction operand; which variant is valid depends on the opcode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Operand {
    #[default]
    None,
    Addr(usize),
    Value(Val),
    /// Frame id plus relative slot offset (`scope`: offset delta)
    Frame { id: usize, offset: i64 },
    Call(CallTarget),
}

/* ===================== Instructions ===================== */

/// One instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub op: Opcode,
    #[serde(default, skip_serializing_if = "Operand::is_none")]
    pub v: Operand,
}

impl Operand {
    fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }
}

impl Code {
    pub fn op(op: Opcode) -> Self {
        Self { op, v: Operand::None }
    }

    pub fn push(v: Val) -> Self {
        Self {
            op: Opcode::Push,
            v: Operand::Value(v),
        }
    }

    pub fn constant(v: Val) -> Self {
        Self {
            op: Opcode::Const,
            v: Operand::Value(v),
        }
    }

    /// Instruction with an address operand (`fork`, `jump`, `jumpifnot`)
    pub fn addr(op: Opcode, pc: usize) -> Self {
        Self {
            op,
            v: Operand::Addr(pc),
        }
    }

    /// Instruction with a frame operand (`load`, `store`, `append`, `scope`)
    pub fn frame(op: Opcode, id: usize, offset: i64) -> Self {
        Self {
            op,
            v: Operand::Frame { id, offset },
        }
    }

    pub fn call(pc: usize) -> Self {
        Self {
            op: Opcode::Call,
            v: Operand::Call(CallTarget::Addr { pc }),
        }
    }

    pub fn call_named(name: impl Into<String>, argc: usize) -> Self {
        Self {
            op: Opcode::Call,
            v: Operand::Call(CallTarget::Named {
                name: name.into(),
                argc,
            }),
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.v {
            Operand::None => write!(f, "{}", self.op),
            Operand::Addr(pc) => write!(f, "{} {}", self.op, pc),
            Operand::Value(v) => write!(f, "{} {}", self.op, v),
            Operand::Frame { id, offset } => write!(f, "{} [{}, {}]", self.op, id, offset),
            Operand::Call(CallTarget::Addr { pc }) => write!(f, "{} {}", self.op, pc),
            Operand::Call(CallTarget::Named { name, argc }) => {
                write!(f, "{} {}/{}", self.op, name, argc)
            }
        }
    }
}

/* ===================== Programs ===================== */

/// Debug metadata: the definition an instruction range belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub name: String,
    pub pc: usize,
}

/// Compiled program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bytecode {
    pub codes: Vec<Code>,
    #[serde(default)]
    pub infos: Vec<CodeInfo>,
}

impl Bytecode {
    pub fn new(codes: Vec<Code>) -> Self {
        Self {
            codes,
            infos: Vec::new(),
        }
    }

    pub fn from_json(source: &str) -> Result<Self, ExecError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Name of the definition containing `pc`, if any info covers it
    pub fn info_at(&self, pc: usize) -> Option<&CodeInfo> {
        self.infos.iter().rev().find(|info| info.pc <= pc)
    }

    /// Human-readable listing, one instruction per line
    pub fn disassemble(&self) -> String {
        let width = self.codes.len().saturating_sub(1).to_string().len();
        let mut out = String::new();
        for (pc, code) in self.codes.iter().enumerate() {
            if let Some(info) = self.infos.iter().find(|info| info.pc == pc) {
                out.push_str(&format!("{}:\n", info.name));
            }
            out.push_str(&format!("  {:>width$}  {}\n", pc, code, width = width));
        }
        out
    }
}
