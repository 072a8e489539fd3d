//! Closure-conversion errors. These are internal invariant violations
//! (spec §7 domain 2): a well-typed surface program should never trigger
//! one, since the converter assumes its input already passed the type
//! checker.

use simply_ir::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("`Fix` binds a non-function type {found}; the type checker should reject this before conversion runs")]
    FixOnNonFunction { found: Type },

    #[error("variable `{name}` resolved to neither a local binding nor a known global during conversion")]
    UnresolvedVariable { name: String },
}
