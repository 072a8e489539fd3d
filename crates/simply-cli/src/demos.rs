//! The seed program catalogue: surface programs built directly as
//! `simply_ir::surface::Program` values, one per scenario. There is no
//! concrete textual syntax for Simply, so these are constructed with the
//! surface AST's builder methods.

use simply_ir::surface::{Def, Expr, Program};
use simply_ir::{BinOpKind, Type};

fn int_to_int() -> Type {
    Type::Fun(Box::new(Type::Int), Box::new(Type::Int))
}

/// `fact : Int -> Int = \n. if n = 0 then 1 else n * fact (n - 1)`, defined
/// by direct top-level recursion.
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

/// `main : Int = fact 5`.
pub fn fact_direct() -> Program {
    Program::new(vec![fact_def(), Def::new("main", Type::Int, Expr::app(Expr::var("fact"), Expr::lit(5)))])
}

/// `main : Int -> Int = \n. fact n`.
pub fn fact_arg() -> Program {
    let main_body = Expr::lam("n", Type::Int, Expr::app(Expr::var("fact"), Expr::var("n")));
    Program::new(vec![fact_def(), Def::new("main", int_to_int(), main_body)])
}

/// `main : Int = let fact = Fix f. \n. if n=0 then 1 else n * f (n-1) in fact 5`
/// — the recursive function is bound locally via `let` rather than declared
/// as its own top-level binding.
pub fn fact_with_let() -> Program {
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

/// `helper : Int -> Int -> Int = \_. fact` — a one-argument function that,
/// once applied, hands back `fact` itself; `main` calls `helper 0` to
/// recover `fact` and applies it to `n`.
pub fn fact_via_helper() -> Program {
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

/// `main : Int = apply (\x. x + 3) 4`.
pub fn ho_const() -> Program {
    let main_body = Expr::app(Expr::app(Expr::var("apply"), add_three()), Expr::lit(4));
    Program::new(vec![apply_def(), Def::new("main", Type::Int, main_body)])
}

/// `main : Int -> Int = \n. apply (\x. x + 3) n` — `apply`'s first argument
/// is a closure with no captures, but the result of `apply (\x. x+3)` is a
/// closure capturing nothing extra either; exercises the captured-value
/// closure path through `apply`'s own partial application.
pub fn ho_add() -> Program {
    let main_body = Expr::lam(
        "n",
        Type::Int,
        Expr::app(Expr::app(Expr::var("apply"), add_three()), Expr::var("n")),
    );
    Program::new(vec![apply_def(), Def::new("main", int_to_int(), main_body)])
}

/// `main : Int -> Int = \n. (Fix f : Int -> Int. \k. if k=0 then 1 else k * f (k-1)) n`.
pub fn fact_fix() -> Program {
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

/// Every seed scenario paired with its name, for iteration by the CLI and
/// integration tests.
pub fn all() -> Vec<(&'static str, Program)> {
    vec![
        ("fact_direct", fact_direct()),
        ("fact_arg", fact_arg()),
        ("fact_with_let", fact_with_let()),
        ("fact_via_helper", fact_via_helper()),
        ("ho_const", ho_const()),
        ("ho_add", ho_add()),
        ("fact_fix", fact_fix()),
    ]
}
