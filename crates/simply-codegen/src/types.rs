//! Mapping from Simply types to LLVM IR types via inkwell (spec §4.3).
//!
//! `TInt` maps to `i32`, `TBool` to `i1`, and every function type to the
//! two-field "closure value" struct `{ i8*(i8*, a')->b', i8* }` — with
//! inkwell's opaque pointers both fields collapse to a plain pointer type,
//! so the struct is simply `{ ptr, ptr }` regardless of the function's
//! arity or argument types.

use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum, StructType};
use inkwell::AddressSpace;
use simply_ir::Type;

pub fn simply_type_to_llvm<'ctx>(context: &'ctx Context, ty: &Type) -> BasicTypeEnum<'ctx> {
    match ty {
        Type::Int => context.i32_type().into(),
        Type::Bool => context.bool_type().into(),
        Type::Fun(..) => closure_struct_type(context).into(),
    }
}

/// The closure value layout shared by every function-typed Simply value:
/// field 0 is the wrapper function pointer, field 1 is the (possibly null)
/// environment pointer.
pub fn closure_struct_type<'ctx>(context: &'ctx Context) -> StructType<'ctx> {
    let ptr = context.ptr_type(AddressSpace::default());
    context.struct_type(&[ptr.into(), ptr.into()], false)
}

/// The layout of a closure's heap-allocated environment: one field per
/// captured value, in declaration order.
pub fn env_struct_type<'ctx>(context: &'ctx Context, captured_types: &[Type]) -> StructType<'ctx> {
    let fields: Vec<BasicTypeEnum<'ctx>> =
        captured_types.iter().map(|t| simply_type_to_llvm(context, t)).collect();
    context.struct_type(&fields, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    #[test]
    fn int_maps_to_i32() {
        let context = Context::create();
        let ty = simply_type_to_llvm(&context, &Type::Int);
        assert!(ty.is_int_type());
        assert_eq!(ty.into_int_type().get_bit_width(), 32);
    }

    #[test]
    fn bool_maps_to_i1() {
        let context = Context::create();
        let ty = simply_type_to_llvm(&context, &Type::Bool);
        assert_eq!(ty.into_int_type().get_bit_width(), 1);
    }

    #[test]
    fn function_type_maps_to_two_field_struct() {
        let context = Context::create();
        let ty = simply_type_to_llvm(&context, &Type::Fun(Box::new(Type::Int), Box::new(Type::Int)));
        assert!(ty.is_struct_type());
        assert_eq!(ty.into_struct_type().count_fields(), 2);
    }

    #[test]
    fn env_struct_has_one_field_per_capture() {
        let context = Context::create();
        let ty = env_struct_type(&context, &[Type::Int, Type::Bool]);
        assert_eq!(ty.count_fields(), 2);
    }
}
