//! The surface AST: the input to the type checker and closure converter.
//!
//! Surface syntax parsing is out of scope (spec §1) — programs are
//! constructed directly as [`Program`] values by the hosting application.

use crate::error::IrError;
use crate::types::{BinOpKind, Type};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered sequence of top-level bindings. All `name`s are unique and at
/// least one binding is named `main`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub defs: Vec<Def>,
}

impl Program {
    pub fn new(defs: Vec<Def>) -> Self {
        Program { defs }
    }

    pub fn find(&self, name: &str) -> Option<&Def> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Checks the structural preconditions of spec §3.2 that the type
    /// checker assumes rather than re-derives: unique top-level names and
    /// the presence of a `main` binding.
    pub fn validate_structure(&self) -> Result<(), IrError> {
        let mut seen = HashSet::new();
        for def in &self.defs {
            if !seen.insert(def.name.as_str()) {
                return Err(IrError::DuplicateName { name: def.name.clone() });
            }
        }
        if self.find("main").is_none() {
            return Err(IrError::MissingMain);
        }
        Ok(())
    }
}

/// A single top-level binding `Def(name, type, body)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Def {
    pub name: String,
    pub ty: Type,
    pub body: Expr,
}

impl Def {
    pub fn new(name: impl Into<String>, ty: Type, body: Expr) -> Self {
        Def { name: name.into(), ty, body }
    }
}

/// A surface expression. Variable shadowing is permitted; inner binders win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Lit(i32),
    LitBool(bool),
    Var(String),
    /// Non-recursive `let name : type = bound; body`.
    Let { name: String, ty: Type, bound: Box<Expr>, body: Box<Expr> },
    If { cond: Box<Expr>, then: Box<Expr>, els: Box<Expr> },
    BinOp { op: BinOpKind, lhs: Box<Expr>, rhs: Box<Expr> },
    /// Single-parameter abstraction; multi-parameter functions nest.
    Lam { param: String, param_ty: Type, body: Box<Expr> },
    /// Single-argument application; multi-argument calls nest.
    App { fun: Box<Expr>, arg: Box<Expr> },
    /// General fixed point: `body` refers to `self_name : self_ty`.
    Fix { self_name: String, self_ty: Type, body: Box<Expr> },
}

impl Expr {
    pub fn lit(n: i32) -> Expr {
        Expr::Lit(n)
    }

    pub fn lit_bool(b: bool) -> Expr {
        Expr::LitBool(b)
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn let_(name: impl Into<String>, ty: Type, bound: Expr, body: Expr) -> Expr {
        Expr::Let { name: name.into(), ty, bound: Box::new(bound), body: Box::new(body) }
    }

    pub fn if_(cond: Expr, then: Expr, els: Expr) -> Expr {
        Expr::If { cond: Box::new(cond), then: Box::new(then), els: Box::new(els) }
    }

    pub fn bin_op(op: BinOpKind, lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn lam(param: impl Into<String>, param_ty: Type, body: Expr) -> Expr {
        Expr::Lam { param: param.into(), param_ty, body: Box::new(body) }
    }

    /// Builds a chain of nested `Lam`s from a parameter list, right-peeled
    /// the same way `Type::curried` builds the matching type.
    pub fn lam_chain(params: &[(String, Type)], body: Expr) -> Expr {
        params.iter().rev().fold(body, |acc, (name, ty)| Expr::lam(name.clone(), ty.clone(), acc))
    }

    pub fn app(fun: Expr, arg: Expr) -> Expr {
        Expr::App { fun: Box::new(fun), arg: Box::new(arg) }
    }

    /// Builds a left-associated application spine from a head and argument
    /// list: `app_chain(f, [a, b])` is `App(App(f, a), b)`.
    pub fn app_chain(fun: Expr, args: Vec<Expr>) -> Expr {
        args.into_iter().fold(fun, Expr::app)
    }

    pub fn fix(self_name: impl Into<String>, self_ty: Type, body: Expr) -> Expr {
        Expr::Fix { self_name: self_name.into(), self_ty, body: Box::new(body) }
    }
}
