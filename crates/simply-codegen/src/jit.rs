//! Verification and JIT execution (spec §4.6).
//!
//! The generated module is verified with LLVM's own verifier before it is
//! handed to an inkwell `ExecutionEngine`; the entry point is then looked
//! up by name and invoked as a raw `(*const i32) -> i32` callable, matching
//! the integer-array-in/int-out convention spec §4.6 specifies for the
//! driver. The `Context`, `Module`, and `ExecutionEngine` are all scoped to
//! a single call of [`run`], mirroring the teacher's function-scoped
//! `Context` isolation (EXEC-04) so no LLVM handle escapes past the
//! returned integer.

use inkwell::context::Context;
use inkwell::execution_engine::FunctionLookupError;
use inkwell::module::Module;
use inkwell::OptimizationLevel;
use thiserror::Error;

use simply_check::typecheck::{check_program, TypeError};
use simply_convert::{convert_program, ConvertError};
use simply_ir::surface;

use crate::codegen::{declare_all, emit_all, emit_entry_point, ENTRY_POINT_NAME};
use crate::error::{CodegenError, VerifyError};

/// A raw argument array in, `i32` result out — the native signature of
/// every compiled `__entry_point` (spec §4.6).
type EntryFn = unsafe extern "C" fn(*const i32) -> i32;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("type error: {0:?}")]
    TypeError(TypeError),
    #[error("closure conversion error: {0}")]
    ConvertError(#[from] ConvertError),
    #[error("code generation error: {0}")]
    CodegenError(#[from] CodegenError),
    #[error("verification error: {0}")]
    VerifyError(#[from] VerifyError),
    #[error("failed to look up the compiled entry point: {0}")]
    LookupError(String),
    #[error("main expects {expected} argument(s), got {found}")]
    ArgumentCountMismatch { expected: usize, found: usize },
}

impl From<FunctionLookupError> for RunError {
    fn from(e: FunctionLookupError) -> Self {
        RunError::LookupError(e.to_string())
    }
}

/// Runs the verifier over `module`, surfacing a failure as [`VerifyError`]
/// rather than aborting the process the way LLVM's default verifier
/// behavior would.
pub fn verify(module: &Module) -> Result<(), VerifyError> {
    module.verify().map_err(|e| VerifyError::Failed(e.to_string()))
}

/// Type-checks, converts, and code-generates `program`, then JIT-executes
/// its `main` with `args` and returns the resulting `Int`.
pub fn run(program: &surface::Program, args: &[i32]) -> Result<i32, RunError> {
    check_program(program).map_err(RunError::TypeError)?;
    let ir_program = convert_program(program)?;

    let main = ir_program.find("main").ok_or(CodegenError::MissingMain)?;
    if main.arity() != args.len() {
        return Err(RunError::ArgumentCountMismatch { expected: main.arity(), found: args.len() });
    }

    inkwell::targets::Target::initialize_native(&inkwell::targets::InitializationConfig::default())
        .map_err(RunError::LookupError)?;

    let context = Context::create();
    let module = context.create_module("simply_program");

    let declared = declare_all(&context, &module, &ir_program);
    emit_all(&context, &module, &ir_program, &declared)?;
    emit_entry_point(&context, &module, &declared, main)?;

    verify(&module)?;

    let engine = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| RunError::LookupError(e.to_string()))?;

    let entry: inkwell::execution_engine::JitFunction<EntryFn> =
        unsafe { engine.get_function(ENTRY_POINT_NAME)? };

    let result = unsafe { entry.call(args.as_ptr()) };
    Ok(result)
}
