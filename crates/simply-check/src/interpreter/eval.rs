//! Substitution-style (environment-based) evaluation of the surface AST.
//!
//! Assumes its input already type-checked (spec §7 domain 2): ill-typed
//! shapes (e.g. a non-`Bool` `If` condition) are `unreachable!()`, not
//! `RuntimeError`s, since they cannot occur once `check_program` accepted
//! the program.

use super::error::RuntimeError;
use super::value::{ClosureValue, Env, FixCell, Value};
use simply_ir::surface::Expr;
use simply_ir::BinOpKind;
use std::rc::Rc;

pub fn eval(env: &Env, expr: &Expr) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Lit(n) => Ok(Value::Int(*n)),
        Expr::LitBool(b) => Ok(Value::Bool(*b)),

        Expr::Var(name) => env.lookup(name).ok_or_else(|| RuntimeError::UnboundVariable { name: name.clone() }),

        Expr::Let { name, bound, body, .. } => {
            let v = eval(env, bound)?;
            eval(&env.extended(name, v), body)
        }

        Expr::If { cond, then, els } => match eval(env, cond)? {
            Value::Bool(true) => eval(env, then),
            Value::Bool(false) => eval(env, els),
            other => unreachable!("if condition must be Bool on well-typed input, got {other:?}"),
        },

        Expr::BinOp { op, lhs, rhs } => {
            let l = eval(env, lhs)?;
            let r = eval(env, rhs)?;
            Ok(eval_bin_op(*op, l, r))
        }

        Expr::Lam { param, body, .. } => Ok(Value::Closure(Rc::new(ClosureValue {
            param: param.clone(),
            body: (**body).clone(),
            env: env.clone(),
        }))),

        Expr::App { fun, arg } => {
            let f = eval(env, fun)?;
            let a = eval(env, arg)?;
            apply(f, a)
        }

        Expr::Fix { self_name, body, .. } => {
            let cell = FixCell(Rc::new(std::cell::RefCell::new(None)));
            let fix_env = env.extended_fix(self_name, cell.clone());
            let v = eval(&fix_env, body)?;
            *cell.0.borrow_mut() = Some(v.clone());
            Ok(v)
        }
    }
}

pub fn apply(f: Value, arg: Value) -> Result<Value, RuntimeError> {
    match f {
        Value::Closure(c) => eval(&c.env.extended(&c.param, arg), &c.body),
        other => Err(RuntimeError::NotAClosure { found: other.type_name() }),
    }
}

fn eval_bin_op(op: BinOpKind, lhs: Value, rhs: Value) -> Value {
    let (a, b) = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => (a, b),
        (l, r) => unreachable!("BinOp operands must be Int on well-typed input, got {l:?} and {r:?}"),
    };
    match op {
        BinOpKind::Add => Value::Int(a.wrapping_add(b)),
        BinOpKind::Sub => Value::Int(a.wrapping_sub(b)),
        BinOpKind::Mul => Value::Int(a.wrapping_mul(b)),
        BinOpKind::Eq => Value::Bool(a == b),
        BinOpKind::Lt => Value::Bool(a < b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_arithmetic() {
        let env = Env::new();
        let e = Expr::bin_op(BinOpKind::Mul, Expr::lit(6), Expr::lit(7));
        match eval(&env, &e).unwrap() {
            Value::Int(42) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn evaluates_let_and_if() {
        let env = Env::new();
        let e = Expr::let_(
            "x",
            simply_ir::Type::Int,
            Expr::lit(3),
            Expr::if_(Expr::bin_op(BinOpKind::Lt, Expr::var("x"), Expr::lit(5)), Expr::lit(1), Expr::lit(0)),
        );
        match eval(&env, &e).unwrap() {
            Value::Int(1) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn applies_closures() {
        let env = Env::new();
        let id = Expr::lam("x", simply_ir::Type::Int, Expr::var("x"));
        let applied = Expr::app(id, Expr::lit(9));
        match eval(&env, &applied).unwrap() {
            Value::Int(9) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fix_ties_the_recursive_knot() {
        let fn_ty = simply_ir::Type::Fun(Box::new(simply_ir::Type::Int), Box::new(simply_ir::Type::Int));
        let body = Expr::lam(
            "k",
            simply_ir::Type::Int,
            Expr::if_(
                Expr::bin_op(BinOpKind::Eq, Expr::var("k"), Expr::lit(0)),
                Expr::lit(1),
                Expr::bin_op(
                    BinOpKind::Mul,
                    Expr::var("k"),
                    Expr::app(Expr::var("f"), Expr::bin_op(BinOpKind::Sub, Expr::var("k"), Expr::lit(1))),
                ),
            ),
        );
        let fact = Expr::fix("f", fn_ty, body);
        let env = Env::new();
        let fact_val = eval(&env, &fact).unwrap();
        let result = apply(fact_val, Value::Int(5)).unwrap();
        match result {
            Value::Int(120) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
