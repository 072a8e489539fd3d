//! End-to-end tests over the seed scenarios: each program is run through
//! the full JIT pipeline and checked both against its expected result and
//! against the reference interpreter (the round-trip equivalence law of
//! spec §8).

use simply_check::interpreter::run_program;
use simply_ir::surface::{Def, Expr, Program};
use simply_ir::{BinOpKind, Type};

fn int_to_int() -> Type {
    Type::Fun(Box::new(Type::Int), Box::new(Type::Int))
}

fn fact_def() -> Def {
    let body = Expr::lam(
        "n",
        Type::Int,
        Expr::if_(
            Expr::bin_op(BinOpKind::Eq, Expr::var("n"), Expr::lit(0)),
            Expr::lit(1),
            Expr::bin_op(
                BinOpKind::Mul,
                Expr::var("n"),
                Expr::app(Expr::var("fact"), Expr::bin_op(BinOpKind::Sub, Expr::var("n"), Expr::lit(1))),
            ),
        ),
    );
    Def::new("fact", int_to_int(), body)
}

fn fact_direct() -> Program {
    Program::new(vec![fact_def(), Def::new("main", Type::Int, Expr::app(Expr::var("fact"), Expr::lit(5)))])
}

fn fact_arg() -> Program {
    let main_body = Expr::lam("n", Type::Int, Expr::app(Expr::var("fact"), Expr::var("n")));
    Program::new(vec![fact_def(), Def::new("main", int_to_int(), main_body)])
}

fn fact_with_let() -> Program {
    let fix_body = Expr::lam(
        "n",
        Type::Int,
        Expr::if_(
            Expr::bin_op(BinOpKind::Eq, Expr::var("n"), Expr::lit(0)),
            Expr::lit(1),
            Expr::bin_op(
                BinOpKind::Mul,
                Expr::var("n"),
                Expr::app(Expr::var("f"), Expr::bin_op(BinOpKind::Sub, Expr::var("n"), Expr::lit(1))),
            ),
        ),
    );
    let fact_fix = Expr::fix("f", int_to_int(), fix_body);
    let main_body = Expr::let_("fact", int_to_int(), fact_fix, Expr::app(Expr::var("fact"), Expr::lit(5)));
    Program::new(vec![Def::new("main", Type::Int, main_body)])
}

fn fact_via_helper() -> Program {
    let helper_ty = Type::Fun(Box::new(Type::Int), Box::new(int_to_int()));
    let helper_body = Expr::lam("_unused", Type::Int, Expr::var("fact"));
    let main_body = Expr::lam(
        "n",
        Type::Int,
        Expr::app(Expr::app(Expr::var("helper"), Expr::lit(0)), Expr::var("n")),
    );
    Program::new(vec![
        fact_def(),
        Def::new("helper", helper_ty, helper_body),
        Def::new("main", int_to_int(), main_body),
    ])
}

fn apply_def() -> Def {
    let apply_ty = Type::curried(&[int_to_int(), Type::Int], Type::Int);
    let apply_body = Expr::lam(
        "f",
        int_to_int(),
        Expr::lam("x", Type::Int, Expr::app(Expr::var("f"), Expr::var("x"))),
    );
    Def::new("apply", apply_ty, apply_body)
}

fn add_three() -> Expr {
    Expr::lam("x", Type::Int, Expr::bin_op(BinOpKind::Add, Expr::var("x"), Expr::lit(3)))
}

fn ho_const() -> Program {
    let main_body = Expr::app(Expr::app(Expr::var("apply"), add_three()), Expr::lit(4));
    Program::new(vec![apply_def(), Def::new("main", Type::Int, main_body)])
}

fn ho_add() -> Program {
    let main_body = Expr::lam(
        "n",
        Type::Int,
        Expr::app(Expr::app(Expr::var("apply"), add_three()), Expr::var("n")),
    );
    Program::new(vec![apply_def(), Def::new("main", int_to_int(), main_body)])
}

fn fact_fix() -> Program {
    let fix_body = Expr::lam(
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
    );
    let main_body =
        Expr::lam("n", Type::Int, Expr::app(Expr::fix("f", int_to_int(), fix_body), Expr::var("n")));
    Program::new(vec![Def::new("main", int_to_int(), main_body)])
}

fn assert_matches_interpreter(program: &Program, args: &[i32]) -> i32 {
    let expected = run_program(program, args).expect("reference interpreter must accept a well-typed seed program");
    let actual = simply_codegen::run(program, args).expect("compiled program must run to completion");
    assert_eq!(actual, expected, "compiled result diverges from the reference interpreter");
    actual
}

#[test]
fn fact_direct_yields_120() {
    assert_eq!(assert_matches_interpreter(&fact_direct(), &[]), 120);
}

#[test]
fn fact_arg_matches_factorial_table() {
    let expected = [1, 1, 2, 6, 24, 120, 720, 5040];
    let program = fact_arg();
    for (n, &want) in expected.iter().enumerate() {
        assert_eq!(assert_matches_interpreter(&program, &[n as i32]), want);
    }
}

#[test]
fn fact_with_let_yields_120() {
    assert_eq!(assert_matches_interpreter(&fact_with_let(), &[]), 120);
}

#[test]
fn fact_via_helper_matches_factorial_table() {
    let expected = [1, 1, 2, 6, 24, 120, 720, 5040];
    let program = fact_via_helper();
    for (n, &want) in expected.iter().enumerate() {
        assert_eq!(assert_matches_interpreter(&program, &[n as i32]), want);
    }
}

#[test]
fn ho_const_yields_7() {
    assert_eq!(assert_matches_interpreter(&ho_const(), &[]), 7);
}

#[test]
fn ho_add_matches_plus_three_table() {
    let program = ho_add();
    for n in 0..8 {
        assert_eq!(assert_matches_interpreter(&program, &[n]), n + 3);
    }
}

#[test]
fn fact_fix_matches_factorial_table() {
    let expected = [1, 1, 2, 6, 24, 120, 720, 5040];
    let program = fact_fix();
    for (n, &want) in expected.iter().enumerate() {
        assert_eq!(assert_matches_interpreter(&program, &[n as i32]), want);
    }
}

#[test]
fn argument_count_mismatch_is_rejected() {
    let err = simply_codegen::run(&fact_direct(), &[1]).unwrap_err();
    assert!(matches!(
        err,
        simply_codegen::RunError::ArgumentCountMismatch { expected: 0, found: 1 }
    ));
}
