//! Free-variable (capture) analysis for lambda lifting.
//!
//! Grounded on the capture-collection pass of a fat-pointer closure
//! lowering implementation: a recursive walk tracking names already bound
//! by an enclosing binder, plus a `seen` set so each captured name is
//! recorded once, in first-occurrence order. Only names that resolve to
//! [`Locals`] are captures — a reference to a top-level or self-recursive
//! name is always addressable by name and is never captured.

use crate::env::Locals;
use simply_ir::surface::Expr;
use simply_ir::Type;
use std::collections::HashSet;

pub fn free_vars(expr: &Expr, mut bound: HashSet<String>, locals: &Locals) -> Vec<(String, Type)> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    walk(expr, &mut bound, locals, &mut seen, &mut order);
    order
        .into_iter()
        .map(|name| {
            let ty = locals
                .lookup(&name)
                .cloned()
                .expect("a name recorded as free must have resolved via `locals`");
            (name, ty)
        })
        .collect()
}

fn walk(expr: &Expr, bound: &mut HashSet<String>, locals: &Locals, seen: &mut HashSet<String>, order: &mut Vec<String>) {
    match expr {
        Expr::Lit(_) | Expr::LitBool(_) => {}

        Expr::Var(name) => {
            if !bound.contains(name) && locals.lookup(name).is_some() && seen.insert(name.clone()) {
                order.push(name.clone());
            }
        }

        Expr::Let { name, bound: value, body, .. } => {
            walk(value, bound, locals, seen, order);
            with_binder(name, bound, |bound| walk(body, bound, locals, seen, order));
        }

        Expr::If { cond, then, els } => {
            walk(cond, bound, locals, seen, order);
            walk(then, bound, locals, seen, order);
            walk(els, bound, locals, seen, order);
        }

        Expr::BinOp { lhs, rhs, .. } => {
            walk(lhs, bound, locals, seen, order);
            walk(rhs, bound, locals, seen, order);
        }

        Expr::Lam { param, body, .. } => {
            with_binder(param, bound, |bound| walk(body, bound, locals, seen, order));
        }

        Expr::App { fun, arg } => {
            walk(fun, bound, locals, seen, order);
            walk(arg, bound, locals, seen, order);
        }

        Expr::Fix { self_name, body, .. } => {
            with_binder(self_name, bound, |bound| walk(body, bound, locals, seen, order));
        }
    }
}

/// Binds `name` for the duration of `action`, restoring the prior state
/// only if this call is the one that introduced it (so re-binding an
/// already-shadowed name doesn't unbind the outer occurrence on return).
fn with_binder(name: &str, bound: &mut HashSet<String>, action: impl FnOnce(&mut HashSet<String>)) {
    let inserted = bound.insert(name.to_string());
    action(bound);
    if inserted {
        bound.remove(name);
    }
}
