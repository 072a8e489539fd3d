//! Closure conversion: lowers a type-checked Simply surface program into
//! the closed, lambda-lifted intermediate representation consumed by code
//! generation.

pub mod convert;
pub mod env;
pub mod error;
pub mod free_vars;

pub use convert::convert_program;
pub use error::ConvertError;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use simply_check::typecheck::check_program;
    use simply_ir::surface::{Def, Expr, Program};
    use simply_ir::{BinOpKind, Type};

    fn fact_fix_ty() -> Type {
        Type::Fun(Box::new(Type::Int), Box::new(Type::Int))
    }

    fn fact_fix_body() -> Expr {
        Expr::lam(
            "k",
            Type::Int,
            Expr::if_(
                Expr::bin_op(BinOpKind::Eq, Expr::var("k"), Expr::lit(0)),
                Expr::lit(1),
                Expr::bin_op(
                    BinOpKind::Mul,
                    Expr::var("k"),
                    Expr::app(Expr::var("f"), Expr::bin_op(BinOpKind::Sub, Expr::var("k"), Expr::lit(1))),
                ),
            ),
        )
    }

    #[test]
    fn fix_program_has_no_surface_only_forms_and_resolves_locals() {
        let program = Program::new(vec![
            Def::new("fact", fact_fix_ty(), Expr::fix("f", fact_fix_ty(), fact_fix_body())),
            Def::new("main", Type::Int, Expr::app(Expr::var("fact"), Expr::lit(5))),
        ]);
        check_program(&program).expect("seed program must type-check");

        let converted = convert_program(&program).expect("conversion must succeed on a well-typed program");
        for global in &converted.globals {
            assert!(!global.body.contains_surface_only_forms());
            assert!(global.body.locals_resolve_within(&global.params));
        }
    }

    #[test]
    fn higher_order_capture_emits_closure_with_one_capture() {
        // apply : (Int -> Int) -> Int -> Int = \f. \x. f x
        // main  : Int -> Int                 = \n. apply (\x. x + 3) n
        let apply_ty = Type::curried(
            &[Type::Fun(Box::new(Type::Int), Box::new(Type::Int)), Type::Int],
            Type::Int,
        );
        let apply_body = Expr::lam(
            "f",
            Type::Fun(Box::new(Type::Int), Box::new(Type::Int)),
            Expr::lam("x", Type::Int, Expr::app(Expr::var("f"), Expr::var("x"))),
        );
        let main_body = Expr::lam(
            "n",
            Type::Int,
            Expr::app(
                Expr::app(
                    Expr::var("apply"),
                    Expr::lam("x", Type::Int, Expr::bin_op(BinOpKind::Add, Expr::var("x"), Expr::lit(3))),
                ),
                Expr::var("n"),
            ),
        );
        let program = Program::new(vec![
            Def::new("apply", apply_ty, apply_body),
            Def::new("main", Type::Fun(Box::new(Type::Int), Box::new(Type::Int)), main_body),
        ]);
        check_program(&program).expect("seed program must type-check");

        let converted = convert_program(&program).expect("conversion must succeed on a well-typed program");
        for global in &converted.globals {
            assert!(!global.body.contains_surface_only_forms());
        }
        // The `\x. x + 3` lambda captures nothing; some generated global
        // built along the way must still construct a closure (either that
        // lambda itself, or `apply`'s curried parameters).
        assert!(converted.globals.iter().any(|g| matches!(g.body, simply_ir::ir::Expr::CallClosure { .. })
            || format!("{:?}", g.body).contains("Closure")));
    }

    fn partial_application_program(bias: i32) -> Program {
        // add3 : Int -> Int -> Int -> Int = \a. \b. \c. a + b + c
        // main : Int                       = add3 1 (2 + bias)
        let add3_ty = Type::curried(&[Type::Int, Type::Int, Type::Int], Type::Int);
        let add3_body = Expr::lam_chain(
            &[("a".into(), Type::Int), ("b".into(), Type::Int), ("c".into(), Type::Int)],
            Expr::bin_op(
                BinOpKind::Add,
                Expr::bin_op(BinOpKind::Add, Expr::var("a"), Expr::var("b")),
                Expr::var("c"),
            ),
        );
        let main_body = Expr::app_chain(
            Expr::var("add3"),
            vec![Expr::lit(1), Expr::bin_op(BinOpKind::Add, Expr::lit(2), Expr::lit(bias))],
        );
        Program::new(vec![
            Def::new("add3", add3_ty, add3_body),
            Def::new("main", Type::Int, main_body),
        ])
    }

    proptest! {
        #[test]
        fn partial_application_converts_cleanly_for_any_bias(bias in -1000i32..1000) {
            let program = partial_application_program(bias);
            check_program(&program).expect("seed program must type-check");
            let converted = convert_program(&program).expect("conversion must succeed on a well-typed program");
            for global in &converted.globals {
                prop_assert!(!global.body.contains_surface_only_forms());
                prop_assert!(global.body.locals_resolve_within(&global.params));
            }
            // A genuine curry-wrapper global must have been synthesised for
            // the 2-of-3-argument partial application of `add3`.
            prop_assert!(converted.globals.len() > 2);
        }
    }
}
