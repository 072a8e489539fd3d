//! Structural errors produced by construction and validation helpers on
//! the AST types themselves (as opposed to type errors, which belong to
//! `simply-check`, and codegen invariant violations, which belong to
//! `simply-codegen`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("duplicate top-level name: {name}")]
    DuplicateName { name: String },

    #[error("program has no binding named `main`")]
    MissingMain,
}
