//! Evaluator errors. Spec §7 guarantees a well-typed Simply program has no
//! recoverable runtime errors; these variants only fire on malformed input
//! to the reference evaluator itself (used solely as a test oracle).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("unbound variable `{name}` during evaluation")]
    UnboundVariable { name: String },

    #[error("applied a non-closure value of type {found}")]
    NotAClosure { found: &'static str },

    #[error("attempted to use a `Fix` binding before its value was constructed: `{name}`")]
    BlackHole { name: String },
}
