//! The Simply type checker (spec §4.1): a single bottom-up synthesis pass
//! over the surface AST with an environment mapping names to declared
//! types. No inference, no polymorphism, no coercion.

pub mod diagnostics;
pub mod env;

pub use diagnostics::TypeError;
pub use env::Env;

use simply_ir::surface::{Def, Expr, Program};
use simply_ir::types::BinOpKind;
use simply_ir::Type;

/// Type-checks a whole program: each binding is checked in declaration
/// order, extending a global environment; forward references are not
/// permitted. Succeeds only if every binding checks and a `main` binding
/// exists of first-order `Int -> ... -> Int` type.
pub fn check_program(program: &Program) -> Result<(), TypeError> {
    let mut env = Env::new();
    for def in &program.defs {
        env.insert(&def.name, def.ty.clone());
        check_def(&env, def)?;
    }

    let main = program.find("main").ok_or(TypeError::MissingMain)?;
    if !main.ty.is_first_order_int() {
        return Err(TypeError::MainNotFirstOrderInt { found: main.ty.clone() });
    }
    Ok(())
}

fn check_def(env: &Env, def: &Def) -> Result<(), TypeError> {
    let found = type_of(env, &def.body)?;
    if found != def.ty {
        return Err(TypeError::TypeMismatch {
            expected: def.ty.clone(),
            found,
            context: "top-level binding",
        });
    }
    Ok(())
}

/// Synthesizes the type of `expr` under `env`, following spec §4.1's
/// per-form rules exactly.
pub fn type_of(env: &Env, expr: &Expr) -> Result<Type, TypeError> {
    match expr {
        Expr::Lit(_) => Ok(Type::Int),
        Expr::LitBool(_) => Ok(Type::Bool),

        Expr::Var(name) => env
            .lookup(name)
            .cloned()
            .ok_or_else(|| TypeError::UnboundVariable { name: name.clone() }),

        Expr::Let { name, ty, bound, body } => {
            let found = type_of(env, bound)?;
            if found != *ty {
                return Err(TypeError::TypeMismatch { expected: ty.clone(), found, context: "let binding" });
            }
            type_of(&env.extended(name, ty.clone()), body)
        }

        Expr::If { cond, then, els } => {
            let cond_ty = type_of(env, cond)?;
            if cond_ty != Type::Bool {
                return Err(TypeError::TypeMismatch {
                    expected: Type::Bool,
                    found: cond_ty,
                    context: "if condition",
                });
            }
            let then_ty = type_of(env, then)?;
            let else_ty = type_of(env, els)?;
            if then_ty != else_ty {
                return Err(TypeError::TypeMismatch {
                    expected: then_ty,
                    found: else_ty,
                    context: "if branches",
                });
            }
            Ok(then_ty)
        }

        Expr::BinOp { op, lhs, rhs } => {
            let expected = op.operand_type();
            let lhs_ty = type_of(env, lhs)?;
            if lhs_ty != expected {
                return Err(TypeError::TypeMismatch { expected, found: lhs_ty, context: bin_op_context(*op) });
            }
            let rhs_ty = type_of(env, rhs)?;
            if rhs_ty != expected {
                return Err(TypeError::TypeMismatch { expected, found: rhs_ty, context: bin_op_context(*op) });
            }
            Ok(op.result_type())
        }

        Expr::Lam { param, param_ty, body } => {
            let body_ty = type_of(&env.extended(param, param_ty.clone()), body)?;
            Ok(Type::Fun(Box::new(param_ty.clone()), Box::new(body_ty)))
        }

        Expr::App { fun, arg } => {
            let fun_ty = type_of(env, fun)?;
            let (param_ty, result_ty) = match fun_ty {
                Type::Fun(p, r) => (*p, *r),
                other => return Err(TypeError::NotAFunction { found: other }),
            };
            let arg_ty = type_of(env, arg)?;
            if arg_ty != param_ty {
                return Err(TypeError::TypeMismatch { expected: param_ty, found: arg_ty, context: "application" });
            }
            Ok(result_ty)
        }

        Expr::Fix { self_name, self_ty, body } => {
            if !self_ty.is_fun() {
                return Err(TypeError::FixOnNonFunction { found: self_ty.clone() });
            }
            let body_ty = type_of(&env.extended(self_name, self_ty.clone()), body)?;
            if body_ty != *self_ty {
                return Err(TypeError::TypeMismatch {
                    expected: self_ty.clone(),
                    found: body_ty,
                    context: "fix body",
                });
            }
            Ok(self_ty.clone())
        }
    }
}

fn bin_op_context(op: BinOpKind) -> &'static str {
    match op {
        BinOpKind::Add => "addition",
        BinOpKind::Sub => "subtraction",
        BinOpKind::Mul => "multiplication",
        BinOpKind::Eq => "equality comparison",
        BinOpKind::Lt => "less-than comparison",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simply_ir::surface::{Def, Program};

    #[test]
    fn literal_types() {
        let env = Env::new();
        assert_eq!(type_of(&env, &Expr::lit(1)), Ok(Type::Int));
        assert_eq!(type_of(&env, &Expr::lit_bool(true)), Ok(Type::Bool));
    }

    #[test]
    fn unbound_variable_errors() {
        let env = Env::new();
        assert_eq!(
            type_of(&env, &Expr::var("x")),
            Err(TypeError::UnboundVariable { name: "x".into() })
        );
    }

    #[test]
    fn let_checks_bound_expression_against_declared_type() {
        let env = Env::new();
        let e = Expr::let_("x", Type::Bool, Expr::lit(1), Expr::var("x"));
        assert!(matches!(type_of(&env, &e), Err(TypeError::TypeMismatch { .. })));
    }

    #[test]
    fn if_requires_bool_condition_and_matching_branches() {
        let env = Env::new();
        let ok = Expr::if_(Expr::lit_bool(true), Expr::lit(1), Expr::lit(2));
        assert_eq!(type_of(&env, &ok), Ok(Type::Int));

        let bad_cond = Expr::if_(Expr::lit(1), Expr::lit(1), Expr::lit(2));
        assert!(matches!(type_of(&env, &bad_cond), Err(TypeError::TypeMismatch { .. })));

        let bad_branches = Expr::if_(Expr::lit_bool(true), Expr::lit(1), Expr::lit_bool(false));
        assert!(matches!(type_of(&env, &bad_branches), Err(TypeError::TypeMismatch { .. })));
    }

    #[test]
    fn bin_op_arithmetic_and_comparison() {
        use simply_ir::BinOpKind;
        let env = Env::new();
        assert_eq!(
            type_of(&env, &Expr::bin_op(BinOpKind::Add, Expr::lit(1), Expr::lit(2))),
            Ok(Type::Int)
        );
        assert_eq!(
            type_of(&env, &Expr::bin_op(BinOpKind::Lt, Expr::lit(1), Expr::lit(2))),
            Ok(Type::Bool)
        );
    }

    #[test]
    fn lambda_and_application() {
        let env = Env::new();
        let id = Expr::lam("x", Type::Int, Expr::var("x"));
        assert_eq!(type_of(&env, &id), Ok(Type::Fun(Box::new(Type::Int), Box::new(Type::Int))));

        let applied = Expr::app(id, Expr::lit(5));
        assert_eq!(type_of(&env, &applied), Ok(Type::Int));
    }

    #[test]
    fn application_of_non_function_errors() {
        let env = Env::new();
        let e = Expr::app(Expr::lit(1), Expr::lit(2));
        assert!(matches!(type_of(&env, &e), Err(TypeError::NotAFunction { .. })));
    }

    #[test]
    fn fix_requires_function_type() {
        let env = Env::new();
        let e = Expr::fix("self", Type::Int, Expr::lit(1));
        assert_eq!(type_of(&env, &e), Err(TypeError::FixOnNonFunction { found: Type::Int }));
    }

    #[test]
    fn fix_factorial_type_checks() {
        use simply_ir::BinOpKind;
        let env = Env::new();
        let fn_ty = Type::Fun(Box::new(Type::Int), Box::new(Type::Int));
        let body = Expr::lam(
            "k",
            Type::Int,
            Expr::if_(
                Expr::bin_op(BinOpKind::Eq, Expr::var("k"), Expr::lit(0)),
                Expr::lit(1),
                Expr::bin_op(
                    BinOpKind::Mul,
                    Expr::var("k"),
                    Expr::app(
                        Expr::var("f"),
                        Expr::bin_op(BinOpKind::Sub, Expr::var("k"), Expr::lit(1)),
                    ),
                ),
            ),
        );
        let e = Expr::fix("f", fn_ty.clone(), body);
        assert_eq!(type_of(&env, &e), Ok(fn_ty));
    }

    #[test]
    fn program_requires_main_and_rejects_forward_references() {
        let helper_calls_main = Program::new(vec![
            Def::new("helper", Type::Int, Expr::var("main")),
            Def::new("main", Type::Int, Expr::lit(0)),
        ]);
        assert_eq!(
            check_program(&helper_calls_main),
            Err(TypeError::UnboundVariable { name: "main".into() })
        );
    }

    #[test]
    fn program_without_main_is_rejected() {
        let p = Program::new(vec![Def::new("helper", Type::Int, Expr::lit(0))]);
        assert_eq!(check_program(&p), Err(TypeError::MissingMain));
    }

    #[test]
    fn program_with_higher_order_main_is_rejected() {
        let p = Program::new(vec![Def::new(
            "main",
            Type::Fun(Box::new(Type::Int), Box::new(Type::Int)),
            Expr::lam("x", Type::Int, Expr::var("x")),
        )]);
        assert!(matches!(check_program(&p), Err(TypeError::MainNotFirstOrderInt { .. })));
    }

    #[test]
    fn program_with_valid_main_succeeds() {
        let p = Program::new(vec![Def::new("main", Type::Int, Expr::lit(42))]);
        assert_eq!(check_program(&p), Ok(()));
    }
}
