//! Code generation and JIT errors, split along the domains of spec §7:
//! internal invariant violations ([`CodegenError`], domain 2 — a well-typed
//! input should never trigger one) and LLVM verification failures
//! ([`VerifyError`], domain 3 — reported rather than aborting so tests can
//! observe it).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unknown local `{0}` during code generation")]
    UnknownLocal(String),

    #[error("global `{0}` referenced but never emitted")]
    UnknownGlobal(String),

    #[error("`main` not found among the program's globals")]
    MissingMain,

    #[error("main's argument count does not match the supplied argument list")]
    ArgumentCountMismatch { expected: usize, found: usize },

    #[error("LLVM builder error: {0}")]
    LlvmError(String),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("LLVM module verification failed: {0}")]
    Failed(String),
}
