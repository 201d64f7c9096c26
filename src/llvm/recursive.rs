//! Recursive `fib` generator, the structural twin of
//! [`crate::reference::fib_recursive_naive`].
//!
//! The function is declared before its body is built so both recursive calls
//! target the handle under construction rather than a second declaration.

use super::context::GenerationContext;
use super::signature::FunctionSignature;
use super::unary_width;
use crate::core::error::CodegenResult;
use inkwell::values::FunctionValue;
use inkwell::IntPredicate;

/// Build the recursive form of `fib` as `name`.
pub fn build_recursive_fib<'ctx>(
    codegen: &mut GenerationContext<'ctx, '_>,
    signature: &FunctionSignature,
    name: &str,
) -> CodegenResult<FunctionValue<'ctx>> {
    let width = unary_width(signature)?;
    let function = codegen.declare_function(signature, name)?;

    let entry = codegen.append_block(function, "entry");
    let base_case = codegen.append_block(function, "base_case");
    let recursive_case = codegen.append_block(function, "recursive_case");

    codegen.position_at_end(entry);
    let n = codegen.param(function, 0)?;
    let one = codegen.const_int(width, 1);
    let two = codegen.const_int(width, 2);
    let is_base = codegen.compare(IntPredicate::SLE, n, one, "is_base")?;
    codegen.cond_branch(is_base, base_case, recursive_case)?;

    codegen.position_at_end(base_case);
    codegen.ret(n)?;

    codegen.position_at_end(recursive_case);
    let n_minus_one = codegen.sub(n, one, "n_minus_one")?;
    let n_minus_two = codegen.sub(n, two, "n_minus_two")?;
    let fib_minus_one = codegen.call(function, &[n_minus_one], "fib_n_minus_one")?;
    let fib_minus_two = codegen.call(function, &[n_minus_two], "fib_n_minus_two")?;
    let sum = codegen.add(fib_minus_one, fib_minus_two, "sum")?;
    codegen.ret(sum)?;

    log::debug!("Built recursive {}", name);
    Ok(function)
}
