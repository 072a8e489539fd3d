//! Runtime symbol declarations for compiled Simply programs.
//!
//! The generated module depends on exactly one external symbol (spec §6):
//! `i8* malloc(i32)`, C calling convention, resolved by the JIT host.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

pub const MALLOC_NAME: &str = "malloc";

pub fn declare_malloc<'ctx>(context: &'ctx Context, module: &Module<'ctx>) -> FunctionValue<'ctx> {
    if let Some(existing) = module.get_function(MALLOC_NAME) {
        return existing;
    }
    let ptr_type = context.ptr_type(AddressSpace::default());
    let fn_type = ptr_type.fn_type(&[context.i32_type().into()], false);
    module.add_function(MALLOC_NAME, fn_type, Some(inkwell::module::Linkage::External))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_malloc_is_idempotent() {
        let context = Context::create();
        let module = context.create_module("test");
        let first = declare_malloc(&context, &module);
        let second = declare_malloc(&context, &module);
        assert_eq!(first, second);
    }
}
