//! Structured type errors (spec §4.1, §7 domain 1). Reported as values,
//! never as process aborts.

use serde::{Deserialize, Serialize};
use simply_ir::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum TypeError {
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type, context: &'static str },

    #[error("unbound variable `{name}`")]
    UnboundVariable { name: String },

    #[error("applied a non-function value of type {found}")]
    NotAFunction { found: Type },

    #[error("`Fix` requires a function type, found {found}")]
    FixOnNonFunction { found: Type },

    #[error("program has no binding named `main`")]
    MissingMain,

    #[error("`main` must have type Int -> ... -> Int, found {found}")]
    MainNotFirstOrderInt { found: Type },
}
