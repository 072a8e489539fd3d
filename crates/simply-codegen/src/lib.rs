//! LLVM code generation and JIT execution for closed, lambda-lifted Simply
//! programs (spec §4-§4.6): global/closure emission via inkwell, and a
//! JIT driver that verifies and runs a compiled `main`.

pub mod builder;
pub mod codegen;
pub mod error;
pub mod jit;
pub mod runtime;
pub mod types;

pub use error::{CodegenError, VerifyError};
pub use jit::{run, verify, RunError};
