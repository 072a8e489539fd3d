//! Closure conversion and lambda-lifting (Surface → Intermediate, spec §4.2).
//!
//! A single traversal that both collects hoisted [`ir::GlobalDef`]s into an
//! accumulator and rewrites the expression tree to reference them. Three
//! environments are threaded through the recursion, each answering a
//! different question: [`Locals`] (is this name a captured runtime value?),
//! [`Known`] (is this name a directly callable global, and under what
//! name/arity?), and a [`simply_check::typecheck::Env`] (what type does
//! this subexpression have? — needed to decide arity reconciliation and to
//! fill in a hoisted lambda's declared result type).

use crate::env::{FuncSig, Known, Locals};
use crate::error::ConvertError;
use crate::free_vars::free_vars;
use simply_check::typecheck::{type_of, Env as TypeEnv};
use simply_ir::surface;
use simply_ir::{ir, Type};
use std::collections::HashSet;

pub fn convert_program(program: &surface::Program) -> Result<ir::Program, ConvertError> {
    let mut base_type_env = TypeEnv::new();
    let mut known = Known::new();
    for def in &program.defs {
        base_type_env.insert(&def.name, def.ty.clone());
        let (params, result_ty, _) = peel_lambda_chain(&def.body, &def.ty);
        let param_types: Vec<Type> = params.iter().map(|(_, t)| t.clone()).collect();
        known = known.extended(
            &def.name,
            FuncSig { global_name: def.name.clone(), arity: params.len(), param_types, result_type: result_ty },
        );
    }

    let mut converter = Converter { globals: Vec::new(), counter: 0, base_type_env };
    for def in &program.defs {
        converter.convert_top_level_def(&known, def)?;
    }
    Ok(ir::Program::new(converter.globals))
}

/// Peels the leading `Lam`s off `expr` in lockstep with `ty`'s `Fun` spine,
/// stopping at the first node that isn't a `Lam` — which may happen before
/// `ty`'s arrows run out: a value-level top-level binding of function type
/// (a thunk that evaluates to a closure) legitimately has zero peeled
/// parameters even though its declared type says otherwise.
fn peel_lambda_chain<'a>(expr: &'a surface::Expr, ty: &Type) -> (Vec<(String, Type)>, Type, &'a surface::Expr) {
    let mut params = Vec::new();
    let mut cur_expr = expr;
    let mut cur_ty = ty.clone();
    loop {
        match (cur_expr, cur_ty.clone()) {
            (surface::Expr::Lam { param, param_ty, body }, Type::Fun(_, result_ty)) => {
                params.push((param.clone(), param_ty.clone()));
                cur_expr = body;
                cur_ty = *result_ty;
            }
            _ => break,
        }
    }
    (params, cur_ty, cur_expr)
}

fn must_type_of(env: &TypeEnv, expr: &surface::Expr) -> Type {
    type_of(env, expr)
        .unwrap_or_else(|e| panic!("closure conversion assumes a type-checked program, but `type_of` failed: {e}"))
}

struct Converter {
    globals: Vec<ir::GlobalDef>,
    counter: u64,
    base_type_env: TypeEnv,
}

impl Converter {
    fn fresh_name(&mut self, basis: &str) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("{basis}${n}")
    }

    fn convert_top_level_def(&mut self, known: &Known, def: &surface::Def) -> Result<(), ConvertError> {
        let (params, result_ty, body) = peel_lambda_chain(&def.body, &def.ty);

        let mut locals = Locals::new();
        let mut type_env = self.base_type_env.clone();
        for (name, ty) in &params {
            locals = locals.extended(name, ty.clone());
            type_env = type_env.extended(name, ty.clone());
        }

        let converted_body = self.convert_expr(known, &locals, &type_env, &def.name, body)?;
        let param_types: Vec<Type> = params.iter().map(|(_, t)| t.clone()).collect();
        let param_names: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
        self.globals.push(ir::GlobalDef::new(def.name.clone(), param_types, result_ty, param_names, converted_body));
        Ok(())
    }

    fn convert_expr(
        &mut self,
        known: &Known,
        locals: &Locals,
        type_env: &TypeEnv,
        prefix: &str,
        expr: &surface::Expr,
    ) -> Result<ir::Expr, ConvertError> {
        match expr {
            surface::Expr::Lit(n) => Ok(ir::Expr::Lit(*n)),
            surface::Expr::LitBool(b) => Ok(ir::Expr::LitBool(*b)),

            surface::Expr::Var(name) => self.convert_var(known, locals, name),

            surface::Expr::Let { name, ty, bound, body } => {
                let converted_bound = self.convert_expr(known, locals, type_env, prefix, bound)?;
                let inner_locals = locals.extended(name, ty.clone());
                let inner_type_env = type_env.extended(name, ty.clone());
                let converted_body = self.convert_expr(known, &inner_locals, &inner_type_env, prefix, body)?;
                Ok(ir::Expr::let_(name.clone(), converted_bound, converted_body))
            }

            surface::Expr::If { cond, then, els } => Ok(ir::Expr::if_(
                self.convert_expr(known, locals, type_env, prefix, cond)?,
                self.convert_expr(known, locals, type_env, prefix, then)?,
                self.convert_expr(known, locals, type_env, prefix, els)?,
            )),

            surface::Expr::BinOp { op, lhs, rhs } => Ok(ir::Expr::bin_op(
                *op,
                self.convert_expr(known, locals, type_env, prefix, lhs)?,
                self.convert_expr(known, locals, type_env, prefix, rhs)?,
            )),

            surface::Expr::Lam { param, param_ty, body } => {
                self.convert_lambda(known, locals, prefix, param, param_ty, body)
            }

            surface::Expr::App { .. } => {
                let (head, args) = collect_spine(expr);
                self.convert_application(known, locals, type_env, prefix, head, args)
            }

            surface::Expr::Fix { self_name, self_ty, body } => {
                self.convert_fix(known, prefix, self_name, self_ty, body)
            }
        }
    }

    fn convert_var(&self, known: &Known, locals: &Locals, name: &str) -> Result<ir::Expr, ConvertError> {
        if let Some(ty) = locals.lookup(name) {
            return Ok(ir::Expr::local(name, ty.clone()));
        }
        if let Some(sig) = known.lookup(name) {
            return Ok(known_reference(sig));
        }
        Err(ConvertError::UnresolvedVariable { name: name.to_string() })
    }

    fn convert_lambda(
        &mut self,
        known: &Known,
        locals: &Locals,
        prefix: &str,
        param: &str,
        param_ty: &Type,
        body: &surface::Expr,
    ) -> Result<ir::Expr, ConvertError> {
        let mut initially_bound = HashSet::new();
        initially_bound.insert(param.to_string());
        let captures = free_vars(body, initially_bound, locals);

        let mut new_locals = Locals::new();
        let mut new_type_env = self.base_type_env.clone();
        for (name, ty) in &captures {
            new_locals = new_locals.extended(name, ty.clone());
            new_type_env = new_type_env.extended(name, ty.clone());
        }
        new_locals = new_locals.extended(param, param_ty.clone());
        new_type_env = new_type_env.extended(param, param_ty.clone());

        let result_ty = must_type_of(&new_type_env, body);
        let fresh = self.fresh_name(prefix);

        let converted_body = self.convert_expr(known, &new_locals, &new_type_env, prefix, body)?;

        let mut param_types: Vec<Type> = captures.iter().map(|(_, t)| t.clone()).collect();
        param_types.push(param_ty.clone());
        let mut param_names: Vec<String> = captures.iter().map(|(n, _)| n.clone()).collect();
        param_names.push(param.to_string());

        self.globals.push(ir::GlobalDef::with_captures(
            fresh.clone(),
            param_types,
            result_ty.clone(),
            param_names,
            converted_body,
            captures.len(),
        ));

        let captured_values = captures
            .iter()
            .map(|(n, t)| ir::Expr::local(n.clone(), t.clone()))
            .collect();
        let apparent_ty = Type::Fun(Box::new(param_ty.clone()), Box::new(result_ty));
        Ok(ir::Expr::closure(fresh, captured_values, apparent_ty))
    }

    /// `Fix(self, t, body)` is lowered zero-capture, matching the spec's
    /// explicit `Closure(selfGlobal, [], t)` construction: the body's only
    /// addressable free name beyond its own peeled parameters is `self`.
    fn convert_fix(
        &mut self,
        known: &Known,
        prefix: &str,
        self_name: &str,
        self_ty: &Type,
        body: &surface::Expr,
    ) -> Result<ir::Expr, ConvertError> {
        if !self_ty.is_fun() {
            return Err(ConvertError::FixOnNonFunction { found: self_ty.clone() });
        }

        let (params, result_ty, inner_body) = peel_lambda_chain(body, self_ty);
        let self_global = self.fresh_name(self_name);

        let mut locals = Locals::new();
        let mut type_env = self.base_type_env.clone();
        for (name, ty) in &params {
            locals = locals.extended(name, ty.clone());
            type_env = type_env.extended(name, ty.clone());
        }

        let self_sig = FuncSig {
            global_name: self_global.clone(),
            arity: params.len(),
            param_types: params.iter().map(|(_, t)| t.clone()).collect(),
            result_type: result_ty.clone(),
        };
        let inner_known = known.extended(self_name, self_sig);

        let converted_body = self.convert_expr(&inner_known, &locals, &type_env, prefix, inner_body)?;
        let param_types: Vec<Type> = params.iter().map(|(_, t)| t.clone()).collect();
        let param_names: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
        self.globals.push(ir::GlobalDef::new(
            self_global.clone(),
            param_types,
            result_ty,
            param_names,
            converted_body,
        ));

        Ok(ir::Expr::closure(self_global, vec![], self_ty.clone()))
    }

    fn convert_application(
        &mut self,
        known: &Known,
        locals: &Locals,
        type_env: &TypeEnv,
        prefix: &str,
        head: &surface::Expr,
        args: Vec<&surface::Expr>,
    ) -> Result<ir::Expr, ConvertError> {
        if let surface::Expr::Var(name) = head {
            if locals.lookup(name).is_none() {
                if let Some(sig) = known.lookup(name).cloned() {
                    let converted_args = args
                        .iter()
                        .map(|a| self.convert_expr(known, locals, type_env, prefix, a))
                        .collect::<Result<Vec<_>, _>>()?;
                    if sig.arity == args.len() {
                        return Ok(ir::Expr::call_known(sig.global_name, converted_args));
                    }

                    let arg_types: Vec<Type> = args.iter().map(|a| must_type_of(type_env, a)).collect();
                    let head_val = known_reference(&sig);
                    let head_ty = Type::curried(&sig.param_types, sig.result_type.clone());
                    // A zero-arity sig (a thunk evaluating to a function
                    // value, not itself a callable global) carries no
                    // physical-arity information beyond its type.
                    let arity = if sig.arity > 0 { sig.arity } else { head_ty.uncurry().0.len() };
                    return Ok(self.saturate(prefix, head_val, arity, head_ty, converted_args, arg_types));
                }
            }
        }

        let converted_head = self.convert_expr(known, locals, type_env, prefix, head)?;
        let head_ty = must_type_of(type_env, head);
        let converted_args = args
            .iter()
            .map(|a| self.convert_expr(known, locals, type_env, prefix, a))
            .collect::<Result<Vec<_>, _>>()?;
        let arg_types: Vec<Type> = args.iter().map(|a| must_type_of(type_env, a)).collect();
        let arity = head_ty.uncurry().0.len();

        Ok(self.saturate(prefix, converted_head, arity, head_ty, converted_args, arg_types))
    }

    /// Reconciles a closure application against its physical arity: exact
    /// matches become a single `CallClosure`; under-application
    /// pre-generates a curry-wrapper global; over-application expands into
    /// a chain of saturated `CallClosure`s, one per arity boundary (spec
    /// §4.5, §9).
    ///
    /// `arity` is the closure's *physical* arity — the underlying global's
    /// `own_arity` when `head_val` is a direct reference, not however many
    /// arrows `head_ty` happens to have. The two diverge whenever a
    /// top-level binding's declared type has more arrows than it has
    /// peeled `Lam`s (e.g. a binding of function type whose body is a
    /// single `Lam` returning another function value): cutting on
    /// `head_ty.uncurry()` there would bundle a second, not-yet-realized
    /// application into the same `CallClosure` and desync codegen's
    /// indirect-call signature from the wrapper it actually calls.
    fn saturate(
        &mut self,
        prefix: &str,
        head_val: ir::Expr,
        arity: usize,
        head_ty: Type,
        mut args: Vec<ir::Expr>,
        mut arg_types: Vec<Type>,
    ) -> ir::Expr {
        debug_assert!(arity >= 1, "closure conversion assumes a type-checked program: applying arguments to a non-function value");
        let (param_types, result_ty) = head_ty.peel(arity);

        if args.len() == arity {
            return ir::Expr::call_closure(head_val, args);
        }
        if args.len() < arity {
            return self.build_curry_wrapper(prefix, head_val, head_ty, args, arg_types, param_types, result_ty);
        }

        let rest_args = args.split_off(arity);
        let rest_types = arg_types.split_off(arity);
        let applied = ir::Expr::call_closure(head_val, args);
        let next_arity = result_ty.uncurry().0.len();
        self.saturate(prefix, applied, next_arity, result_ty, rest_args, rest_types)
    }

    fn build_curry_wrapper(
        &mut self,
        prefix: &str,
        head_val: ir::Expr,
        head_ty: Type,
        supplied_args: Vec<ir::Expr>,
        supplied_arg_types: Vec<Type>,
        full_param_types: Vec<Type>,
        result_ty: Type,
    ) -> ir::Expr {
        let wrapper_name = self.fresh_name(prefix);
        let remaining_types = full_param_types[supplied_args.len()..].to_vec();

        let head_name = "head".to_string();
        let supplied_names: Vec<String> = (0..supplied_args.len()).map(|i| format!("arg{i}")).collect();
        let remaining_names: Vec<String> = (0..remaining_types.len()).map(|i| format!("rest{i}")).collect();

        let mut wrapper_param_types = vec![head_ty.clone()];
        wrapper_param_types.extend(supplied_arg_types.iter().cloned());
        wrapper_param_types.extend(remaining_types.iter().cloned());

        let mut wrapper_params = vec![head_name.clone()];
        wrapper_params.extend(supplied_names.iter().cloned());
        wrapper_params.extend(remaining_names.iter().cloned());

        let mut call_args: Vec<ir::Expr> = supplied_names
            .iter()
            .zip(supplied_arg_types.iter())
            .map(|(n, t)| ir::Expr::local(n.clone(), t.clone()))
            .collect();
        call_args.extend(
            remaining_names
                .iter()
                .zip(remaining_types.iter())
                .map(|(n, t)| ir::Expr::local(n.clone(), t.clone())),
        );

        let body = ir::Expr::call_closure(ir::Expr::local(head_name, head_ty), call_args);
        let wrapper_captures = 1 + supplied_names.len();

        self.globals.push(ir::GlobalDef::with_captures(
            wrapper_name.clone(),
            wrapper_param_types,
            result_ty.clone(),
            wrapper_params,
            body,
            wrapper_captures,
        ));

        let mut captured = vec![head_val];
        captured.extend(supplied_args);
        let wrapper_fun_type = Type::curried(&remaining_types, result_ty);
        ir::Expr::closure(wrapper_name, captured, wrapper_fun_type)
    }
}

fn known_reference(sig: &FuncSig) -> ir::Expr {
    if sig.arity == 0 {
        ir::Expr::call_known(sig.global_name.clone(), vec![])
    } else {
        let fun_ty = Type::curried(&sig.param_types, sig.result_type.clone());
        ir::Expr::closure(sig.global_name.clone(), vec![], fun_ty)
    }
}

/// Collects a maximal left-associated application spine: `f a1 a2 .. an`
/// becomes `(f, [a1, a2, .., an])`.
fn collect_spine(expr: &surface::Expr) -> (&surface::Expr, Vec<&surface::Expr>) {
    let mut args = Vec::new();
    let mut cur = expr;
    while let surface::Expr::App { fun, arg } = cur {
        args.push(arg.as_ref());
        cur = fun;
    }
    args.reverse();
    (cur, args)
}
