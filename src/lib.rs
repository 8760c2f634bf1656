pub mod cli;
pub mod config;
pub mod executor;

// Re-export main types
pub use executor::{run_to_completion, Bytecode, ExecError, Stdlib, Val, VmConfig, VM};
