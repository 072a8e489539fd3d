//! Per-function emission context (spec §4.4): a mutable building context
//! holding the current block, a block-label uniqueness counter, and a
//! symbol table mapping intermediate locals to LLVM operands.
//!
//! Instruction naming and numbering is left to inkwell/LLVM itself (every
//! value-producing instruction is built with an empty name, which LLVM's
//! IR printer renumbers contiguously in program order on its own); this
//! context only tracks what spec §4.4 calls `addBlock`/`setBlock`/`scope`.

use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::values::{BasicValueEnum, FunctionValue};

use crate::error::CodegenError;

pub struct FunctionBuilder<'ctx> {
    context: &'ctx Context,
    llvm: Builder<'ctx>,
    function: FunctionValue<'ctx>,
    block_counter: u32,
    locals: HashMap<String, BasicValueEnum<'ctx>>,
}

impl<'ctx> FunctionBuilder<'ctx> {
    pub fn new(context: &'ctx Context, function: FunctionValue<'ctx>) -> Self {
        FunctionBuilder {
            context,
            llvm: context.create_builder(),
            function,
            block_counter: 0,
            locals: HashMap::new(),
        }
    }

    /// Adds a new block whose label is `label` suffixed with a uniqueness
    /// counter (spec §4.4's `addBlock`).
    pub fn add_block(&mut self, label: &str) -> BasicBlock<'ctx> {
        let n = self.block_counter;
        self.block_counter += 1;
        self.context.append_basic_block(self.function, &format!("{label}.{n}"))
    }

    /// Switches the current insertion point (spec §4.4's `setBlock`).
    pub fn set_block(&mut self, block: BasicBlock<'ctx>) {
        self.llvm.position_at_end(block);
    }

    pub fn current_block(&self) -> BasicBlock<'ctx> {
        self.llvm.get_insert_block().expect("builder always has a current block once positioned")
    }

    pub fn bind(&mut self, name: impl Into<String>, value: BasicValueEnum<'ctx>) {
        self.locals.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        self.locals.get(name).copied().ok_or_else(|| CodegenError::UnknownLocal(name.to_string()))
    }

    /// Runs `action` with the current symbol table saved, restoring it on
    /// exit (spec §4.4's `scope`, used for `Let`).
    pub fn scope<T>(
        &mut self,
        action: impl FnOnce(&mut Self) -> Result<T, CodegenError>,
    ) -> Result<T, CodegenError> {
        let saved = self.locals.clone();
        let result = action(self);
        self.locals = saved;
        result
    }

    pub fn llvm(&self) -> &Builder<'ctx> {
        &self.llvm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::values::BasicValue;

    fn make_function<'ctx>(context: &'ctx Context, module: &inkwell::module::Module<'ctx>) -> FunctionValue<'ctx> {
        let fn_type = context.i32_type().fn_type(&[], false);
        module.add_function("f", fn_type, None)
    }

    #[test]
    fn scope_restores_bindings_on_exit() {
        let context = Context::create();
        let module = context.create_module("test");
        let function = make_function(&context, &module);
        let mut fb = FunctionBuilder::new(&context, function);
        let entry = fb.add_block("entry");
        fb.set_block(entry);

        let zero = context.i32_type().const_int(0, false).as_basic_value_enum();
        fb.bind("x", zero);

        let one = context.i32_type().const_int(1, false).as_basic_value_enum();
        fb.scope(|fb| {
            fb.bind("x", one);
            assert_eq!(fb.lookup("x").unwrap(), one);
            Ok::<_, CodegenError>(())
        })
        .unwrap();

        assert_eq!(fb.lookup("x").unwrap(), zero);
    }

    #[test]
    fn add_block_labels_are_unique() {
        let context = Context::create();
        let module = context.create_module("test");
        let function = make_function(&context, &module);
        let mut fb = FunctionBuilder::new(&context, function);
        let a = fb.add_block("bb");
        let b = fb.add_block("bb");
        assert_ne!(a.get_name(), b.get_name());
    }
}
