//! The Simply type system: shared between the surface and intermediate ASTs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Simply type.
///
/// Multi-argument functions are represented as right-nested `Fun`s:
/// `Int -> Int -> Int` is `Fun(Int, Fun(Int, Int))`. Type equality is
/// structural (`#[derive(PartialEq)]`); there is no unification or
/// inference anywhere in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    Fun(Box<Type>, Box<Type>),
}

impl Type {
    /// Builds a right-nested function type from a list of parameter types
    /// and a result type, i.e. the type of a curried multi-argument function.
    pub fn curried(params: &[Type], result: Type) -> Type {
        params
            .iter()
            .rev()
            .fold(result, |acc, p| Type::Fun(Box::new(p.clone()), Box::new(acc)))
    }

    /// Splits a function type into its flat parameter list and final result
    /// type, following the `Fun` spine to the end. A non-function type
    /// returns an empty parameter list and itself as the result.
    pub fn uncurry(&self) -> (Vec<Type>, Type) {
        let mut params = Vec::new();
        let mut cur = self;
        while let Type::Fun(a, b) = cur {
            params.push((**a).clone());
            cur = b;
        }
        (params, cur.clone())
    }

    /// Splits off exactly `n` leading arrows, returning their parameter
    /// types and the remaining type — which may itself still be a `Fun`.
    /// Unlike [`Type::uncurry`], this does not run to the end of the `Fun`
    /// spine: it stops exactly at the physical arity a caller supplies,
    /// distinct from however many arrows the declared type happens to have
    /// (a global's own arity can be smaller than its result type's arrows).
    ///
    /// Panics if `self` has fewer than `n` leading arrows; callers only
    /// invoke this with an `n` already known not to exceed the type's depth.
    pub fn peel(&self, n: usize) -> (Vec<Type>, Type) {
        let mut params = Vec::with_capacity(n);
        let mut cur = self.clone();
        for _ in 0..n {
            match cur {
                Type::Fun(p, r) => {
                    params.push(*p);
                    cur = *r;
                }
                other => panic!("Type::peel({n}) ran out of arrows at {other}"),
            }
        }
        (params, cur)
    }

    /// True for `Int -> ... -> Int` with zero or more `Int` arguments
    /// (the shape required of `main`, spec §4.1).
    pub fn is_first_order_int(&self) -> bool {
        let (params, result) = self.uncurry();
        result == Type::Int && params.iter().all(|t| *t == Type::Int)
    }

    pub fn is_fun(&self) -> bool {
        matches!(self, Type::Fun(..))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Bool => write!(f, "Bool"),
            Type::Fun(a, b) => write!(f, "({a} -> {b})"),
        }
    }
}

/// The binary operators available in `BinOp`, per spec §3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Eq,
    Lt,
}

impl BinOpKind {
    /// Arithmetic ops take and return `Int`; comparisons take `Int` and
    /// return `Bool`.
    pub fn result_type(self) -> Type {
        match self {
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul => Type::Int,
            BinOpKind::Eq | BinOpKind::Lt => Type::Bool,
        }
    }

    /// Every operand of every `BinOp` is `Int` (spec §3.2).
    pub fn operand_type(self) -> Type {
        Type::Int
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curried_roundtrips_through_uncurry() {
        let t = Type::curried(&[Type::Int, Type::Bool], Type::Int);
        assert_eq!(t, Type::Fun(Box::new(Type::Int), Box::new(Type::Fun(Box::new(Type::Bool), Box::new(Type::Int)))));
        let (params, result) = t.uncurry();
        assert_eq!(params, vec![Type::Int, Type::Bool]);
        assert_eq!(result, Type::Int);
    }

    #[test]
    fn peel_stops_short_of_the_full_spine() {
        let t = Type::curried(&[Type::Int], Type::curried(&[Type::Int], Type::Int));
        let (params, rest) = t.peel(1);
        assert_eq!(params, vec![Type::Int]);
        assert_eq!(rest, Type::curried(&[Type::Int], Type::Int));
    }

    #[test]
    fn zero_arity_curried_is_identity() {
        let t = Type::curried(&[], Type::Int);
        assert_eq!(t, Type::Int);
    }

    #[test]
    fn first_order_int_accepts_zero_or_more_int_args() {
        assert!(Type::Int.is_first_order_int());
        assert!(Type::curried(&[Type::Int], Type::Int).is_first_order_int());
        assert!(Type::curried(&[Type::Int, Type::Int], Type::Int).is_first_order_int());
        assert!(!Type::curried(&[Type::Bool], Type::Int).is_first_order_int());
        assert!(!Type::curried(&[Type::Int], Type::Bool).is_first_order_int());
    }

    #[test]
    fn higher_order_main_is_rejected() {
        let fn_arg = Type::Fun(Box::new(Type::Int), Box::new(Type::Int));
        let t = Type::curried(&[fn_arg], Type::Int);
        assert!(!t.is_first_order_int());
    }

    #[test]
    fn display_nests_function_types() {
        let t = Type::Fun(Box::new(Type::Int), Box::new(Type::Fun(Box::new(Type::Int), Box::new(Type::Bool))));
        assert_eq!(t.to_string(), "(Int -> (Int -> Bool))");
    }

    #[test]
    fn serde_roundtrip() {
        let t = Type::curried(&[Type::Int, Type::Bool], Type::Int);
        let json = serde_json::to_string(&t).unwrap();
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
