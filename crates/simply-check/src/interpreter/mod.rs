//! The reference evaluator: a direct denotational interpreter over the
//! surface AST, used as a test oracle for the round-trip equivalence law
//! of spec §8 ("the compiled program and a direct evaluation of the
//! surface program agree on every input"). Never runs in the compiled
//! path.

pub mod error;
pub mod eval;
pub mod value;

pub use error::RuntimeError;
pub use eval::{apply, eval};
pub use value::{Env, FixCell, Value};

use simply_ir::surface::Program;
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluates every top-level binding in declaration order, extending the
/// environment as it goes; a binding's own name is already in scope while
/// its own body is evaluated (the same `FixCell` knot-tying `Fix` uses),
/// so direct top-level recursion (e.g. `fact` calling `fact`) works without
/// an explicit `Fix`. Forward references to *later* bindings still fail,
/// since those names aren't inserted yet. Then applies `main` to `args`
/// one argument at a time.
pub fn run_program(program: &Program, args: &[i32]) -> Result<i32, RuntimeError> {
    let mut env = Env::new();
    for def in &program.defs {
        let cell = FixCell(Rc::new(RefCell::new(None)));
        let def_env = env.extended_fix(&def.name, cell.clone());
        let v = eval(&def_env, &def.body)?;
        *cell.0.borrow_mut() = Some(v);
        env = def_env;
    }

    let main = env.lookup("main").ok_or_else(|| RuntimeError::UnboundVariable { name: "main".into() })?;
    let mut result = main;
    for &arg in args {
        result = apply(result, Value::Int(arg))?;
    }

    match result {
        Value::Int(n) => Ok(n),
        other => unreachable!("main must evaluate to Int on well-typed input, got {other:?}"),
    }
}
