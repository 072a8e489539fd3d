//! Type checking and reference evaluation for Simply surface programs.

pub mod interpreter;
pub mod typecheck;

pub use interpreter::RuntimeError;
pub use typecheck::{check_program, type_of, TypeError};
