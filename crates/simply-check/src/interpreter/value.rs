//! Runtime values for the reference evaluator.
//!
//! This is the denotational counterpart used to state the round-trip law
//! of spec §8 ("running the compiled program on `xs` yields the same
//! integer as a direct evaluator of `P` on `xs`"); it is test-only and
//! never runs in the compiled-program path.

use simply_ir::surface::Expr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Closure(Rc<ClosureValue>),
}

pub struct ClosureValue {
    pub param: String,
    pub body: Expr,
    pub env: Env,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::Closure(_) => "Closure",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Closure(_) => write!(f, "<closure>"),
        }
    }
}

/// A slot a `Fix` binding resolves into once its recursive value has been
/// constructed. Looking one up before it is filled is a logic error in the
/// evaluator, not a representable Simply runtime error (spec §7: there are
/// no recoverable runtime errors in a well-typed program).
#[derive(Clone)]
pub struct FixCell(pub Rc<RefCell<Option<Value>>>);

/// A persistent, cheaply-cloneable association list environment mapping
/// names to either an already-evaluated value or a `Fix` slot.
#[derive(Clone, Default)]
pub struct Env(Option<Rc<EnvNode>>);

enum Binding {
    Value(Value),
    Fix(FixCell),
}

struct EnvNode {
    name: String,
    binding: Binding,
    parent: Env,
}

impl Env {
    pub fn new() -> Self {
        Env(None)
    }

    pub fn extended(&self, name: &str, value: Value) -> Env {
        Env(Some(Rc::new(EnvNode {
            name: name.to_string(),
            binding: Binding::Value(value),
            parent: self.clone(),
        })))
    }

    pub fn extended_fix(&self, name: &str, cell: FixCell) -> Env {
        Env(Some(Rc::new(EnvNode {
            name: name.to_string(),
            binding: Binding::Fix(cell),
            parent: self.clone(),
        })))
    }

    /// Looks up `name`, forcing a `Fix` slot if the binding found is one.
    /// Returns `None` for an unresolved `Fix` slot (the black-hole case).
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut cur = self;
        loop {
            let node = cur.0.as_ref()?;
            if node.name == name {
                return match &node.binding {
                    Binding::Value(v) => Some(v.clone()),
                    Binding::Fix(cell) => cell.0.borrow().clone(),
                };
            }
            cur = &node.parent;
        }
    }
}
