//! Data description of Simply programs: the Simply type system, the surface
//! AST (spec §3.2), and the closed, lambda-lifted intermediate AST produced
//! by closure conversion (spec §3.3).

pub mod error;
pub mod ir;
pub mod surface;
pub mod types;

pub use error::IrError;
pub use types::{BinOpKind, Type};
