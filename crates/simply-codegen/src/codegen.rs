//! Global and expression code generation (spec §4.4-§4.5).
//!
//! Every [`simply_ir::ir::GlobalDef`] becomes *two* LLVM functions:
//!
//! - `name`, the global's real body. For a zero-capture global (every
//!   top-level definition, every `Fix` self-global) this takes exactly
//!   `param_types` and nothing else. For a global with `captures > 0`
//!   (a lambda-lifted lambda body or a curry wrapper) the leading
//!   `captures` parameters are replaced by a single opaque `env`
//!   pointer, and the body prologue loads each captured field back out
//!   of it.
//! - `name$wrapped`, always `(ptr env, own_param_types...) -> result`,
//!   the signature every [`Expr::Closure`] construction points its
//!   field-0 function pointer at (spec §4.5) regardless of whether the
//!   global actually captures anything. For a zero-capture global it
//!   simply discards `env` and forwards to `name`; for a capturing
//!   global its signature already matches `name`'s, so it forwards
//!   every parameter unchanged.
//!
//! `fast` calling convention is used for both, and for every call
//! between them, matching the teacher's convention for internally
//! generated functions; `main`'s JIT entry point uses default linkage
//! so the host can look it up by name.

use std::collections::HashMap;

use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicType;
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, IntPredicate};

use simply_ir::ir::{Expr, GlobalDef, Program};
use simply_ir::types::{BinOpKind, Type};

use crate::builder::FunctionBuilder;
use crate::error::CodegenError;
use crate::runtime::declare_malloc;
use crate::types::{closure_struct_type, env_struct_type, simply_type_to_llvm};

/// LLVM's numeric id for the `fast` calling convention.
const FAST_CC: u32 = 8;

/// The name the JIT looks up after compilation (spec §4.6).
pub const ENTRY_POINT_NAME: &str = "__entry_point";

fn wrapped_name(global: &str) -> String {
    format!("{global}$wrapped")
}

/// Recovers the Simply type of an already-converted intermediate
/// expression without an external type environment, relying on the type
/// annotations the closure converter carries on `Local`/`Global`/`Closure`
/// and on every `CallClosure` being fully saturated by construction.
pub fn ir_expr_type(program: &Program, expr: &Expr) -> Type {
    match expr {
        Expr::Lit(_) => Type::Int,
        Expr::LitBool(_) => Type::Bool,
        Expr::Local { ty, .. } | Expr::Global { ty, .. } | Expr::Closure { ty, .. } => ty.clone(),
        Expr::Let { body, .. } => ir_expr_type(program, body),
        Expr::If { then, .. } => ir_expr_type(program, then),
        Expr::BinOp { op, .. } => op.result_type(),
        Expr::CallKnown { global, .. } => {
            program.find(global).expect("CallKnown target must exist").result_type.clone()
        }
        Expr::CallClosure { closure, args } => ir_expr_type(program, closure).peel(args.len()).1,
    }
}

/// Declares (but does not define) every global's two LLVM functions, so
/// that forward references within and across bodies resolve regardless
/// of emission order.
pub fn declare_all<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    program: &Program,
) -> HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)> {
    let ptr = context.ptr_type(AddressSpace::default());
    let mut declared = HashMap::new();

    for global in &program.globals {
        let own_types: Vec<_> = global.param_types[global.captures..]
            .iter()
            .map(|t| simply_type_to_llvm(context, t).into())
            .collect();
        let result = simply_type_to_llvm(context, &global.result_type);

        let real_fn = if global.captures == 0 {
            let params: Vec<_> =
                global.param_types.iter().map(|t| simply_type_to_llvm(context, t).into()).collect();
            let fn_type = result.fn_type(&params, false);
            let f = module.add_function(&global.name, fn_type, None);
            f.set_call_conventions(FAST_CC);
            f
        } else {
            let mut params = vec![ptr.into()];
            params.extend(own_types.clone());
            let fn_type = result.fn_type(&params, false);
            let f = module.add_function(&global.name, fn_type, None);
            f.set_call_conventions(FAST_CC);
            f
        };

        let mut wrapper_params = vec![ptr.into()];
        wrapper_params.extend(own_types);
        let wrapper_type = result.fn_type(&wrapper_params, false);
        let wrapper_fn = module.add_function(&wrapped_name(&global.name), wrapper_type, None);
        wrapper_fn.set_call_conventions(FAST_CC);

        declared.insert(global.name.clone(), (real_fn, wrapper_fn));
    }

    declared
}

/// Defines every global's real body and its `$wrapped` forwarding shim.
pub fn emit_all<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    program: &Program,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
) -> Result<(), CodegenError> {
    for global in &program.globals {
        emit_global_body(context, module, program, declared, global)?;
        emit_wrapper_body(context, declared, global)?;
    }
    Ok(())
}

fn emit_global_body<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    program: &Program,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
    global: &GlobalDef,
) -> Result<(), CodegenError> {
    let (real_fn, _) = declared[&global.name];
    let mut fb = FunctionBuilder::new(context, real_fn);
    let entry = fb.add_block("entry");
    fb.set_block(entry);

    if global.captures == 0 {
        for (i, name) in global.params.iter().enumerate() {
            let arg = real_fn.get_nth_param(i as u32).expect("param count matches signature");
            fb.bind(name.clone(), arg);
        }
    } else {
        let env_ptr = real_fn.get_nth_param(0).expect("capturing global always has env param").into_pointer_value();
        let captured_types = &global.param_types[..global.captures];
        let env_ty = env_struct_type(context, captured_types);
        for (i, name) in global.params[..global.captures].iter().enumerate() {
            let field_ptr = fb
                .llvm()
                .build_struct_gep(env_ty, env_ptr, i as u32, &format!("cap.{i}"))
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            let field_ty = simply_type_to_llvm(context, &captured_types[i]);
            let loaded = fb
                .llvm()
                .build_load(field_ty, field_ptr, &format!("cap.{i}.v"))
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            fb.bind(name.clone(), loaded);
        }
        for (i, name) in global.params[global.captures..].iter().enumerate() {
            let arg = real_fn
                .get_nth_param((i + 1) as u32)
                .expect("own param count matches signature minus env");
            fb.bind(name.clone(), arg);
        }
    }

    let result = emit_expr(context, module, program, declared, &mut fb, &global.body)?;
    fb.llvm().build_return(Some(&result)).map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    Ok(())
}

fn emit_wrapper_body<'ctx>(
    context: &'ctx Context,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
    global: &GlobalDef,
) -> Result<(), CodegenError> {
    let (real_fn, wrapper_fn) = declared[&global.name];
    let builder = context.create_builder();
    let entry = context.append_basic_block(wrapper_fn, "entry");
    builder.position_at_end(entry);

    let args: Vec<BasicValueEnum> = if global.captures == 0 {
        // env is param 0 of the wrapper, discarded; own params start at 1.
        (1..wrapper_fn.count_params()).map(|i| wrapper_fn.get_nth_param(i).unwrap()).collect()
    } else {
        (0..wrapper_fn.count_params()).map(|i| wrapper_fn.get_nth_param(i).unwrap()).collect()
    };

    let args: Vec<_> = args.into_iter().map(|v| v.into()).collect();
    let call = builder.build_direct_call(real_fn, &args, "call").map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    call.set_call_convention(FAST_CC);
    let result = call.try_as_basic_value().left().expect("global body never returns void");
    builder.build_return(Some(&result)).map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    Ok(())
}

fn emit_expr<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    program: &Program,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
    fb: &mut FunctionBuilder<'ctx>,
    expr: &Expr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    match expr {
        Expr::Lit(n) => Ok(context.i32_type().const_int(*n as u64, true).into()),

        Expr::LitBool(b) => Ok(context.bool_type().const_int(*b as u64, false).into()),

        Expr::Local { name, .. } => fb.lookup(name),

        Expr::Global { name, ty } => {
            // A bare top-level function reference with no captures: build a
            // closure value pointing straight at its wrapper, null env.
            let (_, wrapper_fn) = declared.get(name).ok_or_else(|| CodegenError::UnknownGlobal(name.clone()))?;
            build_closure_value(context, fb, wrapper_fn.as_global_value().as_pointer_value(), None, ty)
        }

        Expr::Let { name, bound, body } => {
            let value = emit_expr(context, module, program, declared, fb, bound)?;
            fb.scope(|fb| {
                fb.bind(name.clone(), value);
                emit_expr(context, module, program, declared, fb, body)
            })
        }

        Expr::If { cond, then, els } => emit_if(context, module, program, declared, fb, cond, then, els),

        Expr::BinOp { op, lhs, rhs } => {
            let l = emit_expr(context, module, program, declared, fb, lhs)?.into_int_value();
            let r = emit_expr(context, module, program, declared, fb, rhs)?.into_int_value();
            emit_binop(fb, *op, l, r)
        }

        Expr::Closure { global, captured, ty } => {
            let (_, wrapper_fn) =
                declared.get(global).ok_or_else(|| CodegenError::UnknownGlobal(global.clone()))?;
            if captured.is_empty() {
                return build_closure_value(context, fb, wrapper_fn.as_global_value().as_pointer_value(), None, ty);
            }

            let captured_types: Vec<Type> =
                captured.iter().map(|e| ir_expr_type(program, e)).collect();
            let env_ty = env_struct_type(context, &captured_types);
            let malloc_fn = declare_malloc(context, module);

            let size = sizeof_struct(context, fb, env_ty)?;
            let call = fb
                .llvm()
                .build_direct_call(malloc_fn, &[size.into()], "env.raw")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            let env_ptr =
                call.try_as_basic_value().left().expect("malloc returns a value").into_pointer_value();

            for (i, captured_expr) in captured.iter().enumerate() {
                let value = emit_expr(context, module, program, declared, fb, captured_expr)?;
                let field_ptr = fb
                    .llvm()
                    .build_struct_gep(env_ty, env_ptr, i as u32, &format!("env.field.{i}"))
                    .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
                fb.llvm().build_store(field_ptr, value).map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            }

            build_closure_value(context, fb, wrapper_fn.as_global_value().as_pointer_value(), Some(env_ptr), ty)
        }

        Expr::CallKnown { global, args } => {
            let (real_fn, _) =
                *declared.get(global).ok_or_else(|| CodegenError::UnknownGlobal(global.clone()))?;
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(emit_expr(context, module, program, declared, fb, arg)?.into());
            }
            let call = fb
                .llvm()
                .build_direct_call(real_fn, &arg_values, "call")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            call.set_call_convention(FAST_CC);
            Ok(call.try_as_basic_value().left().expect("global body never returns void"))
        }

        Expr::CallClosure { closure, args } => {
            let closure_value = emit_expr(context, module, program, declared, fb, closure)?.into_struct_value();
            let fn_ptr = fb
                .llvm()
                .build_extract_value(closure_value, 0, "closure.fn")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?
                .into_pointer_value();
            let env_ptr = fb
                .llvm()
                .build_extract_value(closure_value, 1, "closure.env")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?
                .into_pointer_value();

            // `args.len()` is this call's physical arity (simply-convert's
            // `saturate` cuts every `CallClosure` at the closure's own
            // arity), so peeling exactly that many arrows off the closure's
            // static type gives the real wrapper signature — even when the
            // closure's full type has further, not-yet-applied arrows.
            let closure_ty = ir_expr_type(program, closure);
            let (param_types, result_ty) = closure_ty.peel(args.len());
            let arg_llvm_types: Vec<_> =
                param_types.iter().map(|t| simply_type_to_llvm(context, t).into()).collect();
            let result_llvm = simply_type_to_llvm(context, &result_ty);

            let mut fn_param_types = vec![context.ptr_type(AddressSpace::default()).into()];
            fn_param_types.extend(arg_llvm_types);
            let fn_type = result_llvm.fn_type(&fn_param_types, false);

            let mut call_args: Vec<inkwell::values::BasicMetadataValueEnum> = vec![env_ptr.into()];
            for arg in args {
                call_args.push(emit_expr(context, module, program, declared, fb, arg)?.into());
            }

            let call = fb
                .llvm()
                .build_indirect_call(fn_type, fn_ptr, &call_args, "icall")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            call.set_call_convention(FAST_CC);
            Ok(call.try_as_basic_value().left().expect("closure body never returns void"))
        }
    }
}

fn sizeof_struct<'ctx>(
    context: &'ctx Context,
    fb: &FunctionBuilder<'ctx>,
    struct_ty: inkwell::types::StructType<'ctx>,
) -> Result<IntValue<'ctx>, CodegenError> {
    let ptr_ty = context.ptr_type(AddressSpace::default());
    let null = ptr_ty.const_null();
    let one = context.i32_type().const_int(1, false);
    let gep = unsafe {
        fb.llvm()
            .build_in_bounds_gep(struct_ty, null, &[one], "sizeof.gep")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?
    };
    fb.llvm()
        .build_ptr_to_int(gep, context.i32_type(), "sizeof.int")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))
}

fn build_closure_value<'ctx>(
    context: &'ctx Context,
    fb: &FunctionBuilder<'ctx>,
    fn_ptr: PointerValue<'ctx>,
    env_ptr: Option<PointerValue<'ctx>>,
    ty: &Type,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    debug_assert!(ty.is_fun(), "a Closure's carried type must be a function type");
    let struct_ty = closure_struct_type(context);
    let env = env_ptr.unwrap_or_else(|| context.ptr_type(AddressSpace::default()).const_null());
    let agg = struct_ty.get_undef();
    let agg = fb
        .llvm()
        .build_insert_value(agg, fn_ptr, 0, "closure.0")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    let agg = fb
        .llvm()
        .build_insert_value(agg, env, 1, "closure.1")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    Ok(agg.as_basic_value_enum())
}

fn emit_binop<'ctx>(
    fb: &mut FunctionBuilder<'ctx>,
    op: BinOpKind,
    lhs: IntValue<'ctx>,
    rhs: IntValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let to_err = |e: inkwell::builder::BuilderError| CodegenError::LlvmError(e.to_string());
    match op {
        BinOpKind::Add => Ok(fb.llvm().build_int_add(lhs, rhs, "add").map_err(to_err)?.into()),
        BinOpKind::Sub => Ok(fb.llvm().build_int_sub(lhs, rhs, "sub").map_err(to_err)?.into()),
        BinOpKind::Mul => Ok(fb.llvm().build_int_mul(lhs, rhs, "mul").map_err(to_err)?.into()),
        BinOpKind::Eq => {
            Ok(fb.llvm().build_int_compare(IntPredicate::EQ, lhs, rhs, "eq").map_err(to_err)?.into())
        }
        BinOpKind::Lt => {
            Ok(fb.llvm().build_int_compare(IntPredicate::SLT, lhs, rhs, "lt").map_err(to_err)?.into())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_if<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    program: &Program,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
    fb: &mut FunctionBuilder<'ctx>,
    cond: &Expr,
    then: &Expr,
    els: &Expr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let cond_value = emit_expr(context, module, program, declared, fb, cond)?.into_int_value();

    let then_bb = fb.add_block("if.then");
    let else_bb = fb.add_block("if.else");
    let merge_bb = fb.add_block("if.merge");

    fb.llvm()
        .build_conditional_branch(cond_value, then_bb, else_bb)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    fb.set_block(then_bb);
    let then_value = emit_expr(context, module, program, declared, fb, then)?;
    let then_end_bb = fb.current_block();
    fb.llvm().build_unconditional_branch(merge_bb).map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    fb.set_block(else_bb);
    let else_value = emit_expr(context, module, program, declared, fb, els)?;
    let else_end_bb = fb.current_block();
    fb.llvm().build_unconditional_branch(merge_bb).map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    fb.set_block(merge_bb);
    let phi = fb.llvm().build_phi(then_value.get_type(), "if.result").map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    phi.add_incoming(&[(&then_value, then_end_bb), (&else_value, else_end_bb)]);
    Ok(phi.as_basic_value())
}

/// Builds the `__entry_point` function the JIT looks up (spec §4.6): a
/// default-linkage function taking a raw `i32*` argument array and
/// returning `main`'s result, unpacking each array slot into an `Int`
/// argument for `main`'s `CallKnown`.
pub fn emit_entry_point<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    declared: &HashMap<String, (FunctionValue<'ctx>, FunctionValue<'ctx>)>,
    main: &GlobalDef,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    if main.captures != 0 || main.result_type != Type::Int {
        return Err(CodegenError::MissingMain);
    }
    let (real_main, _) = *declared.get(&main.name).ok_or(CodegenError::MissingMain)?;

    let ptr = context.ptr_type(AddressSpace::default());
    let fn_type = context.i32_type().fn_type(&[ptr.into()], false);
    let entry_fn = module.add_function(ENTRY_POINT_NAME, fn_type, Some(Linkage::External));

    let builder = context.create_builder();
    let bb = context.append_basic_block(entry_fn, "entry");
    builder.position_at_end(bb);

    let argv = entry_fn.get_nth_param(0).expect("entry point takes the argument array").into_pointer_value();
    let mut call_args = Vec::with_capacity(main.arity());
    for i in 0..main.arity() {
        let idx = context.i32_type().const_int(i as u64, false);
        let slot = unsafe {
            builder
                .build_in_bounds_gep(context.i32_type(), argv, &[idx], &format!("arg.{i}.ptr"))
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        };
        let value = builder
            .build_load(context.i32_type(), slot, &format!("arg.{i}"))
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
        call_args.push(value.into());
    }

    let call =
        builder.build_direct_call(real_main, &call_args, "main.call").map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    call.set_call_convention(FAST_CC);
    let result = call.try_as_basic_value().left().expect("main returns Int");
    builder.build_return(Some(&result)).map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    Ok(entry_fn)
}
