//! Loop-based `fib` generator.
//!
//! ```text
//! entry:        a = 1; b = 1; i = 2; br loop_header
//! loop_header:  if i < n goto loop_body else exit
//! loop_body:    next = a + b; a = b; b = next; i = i + 1; br loop_header
//! exit:         ret b
//! ```
//!
//! The loop body never runs for n <= 2, so those inputs return the initial
//! `b = 1`. In particular the generated `fib(0)` is 1, unlike
//! [`crate::reference::fib_iterative`]. Loop-carried variables live in
//! [`MutableSlot`](super::slot::MutableSlot)s.

use super::context::GenerationContext;
use super::signature::FunctionSignature;
use super::unary_width;
use crate::core::error::CodegenResult;
use inkwell::values::FunctionValue;
use inkwell::IntPredicate;

/// Build the iterative form of `fib` as `name`.
pub fn build_iterative_fib<'ctx>(
    codegen: &mut GenerationContext<'ctx, '_>,
    signature: &FunctionSignature,
    name: &str,
) -> CodegenResult<FunctionValue<'ctx>> {
    let width = unary_width(signature)?;
    let function = codegen.declare_function(signature, name)?;

    let entry = codegen.append_block(function, "entry");
    let loop_header = codegen.append_block(function, "loop_header");
    let loop_body = codegen.append_block(function, "loop_body");
    let exit = codegen.append_block(function, "exit");

    codegen.position_at_end(entry);
    let n = codegen.param(function, 0)?;
    let one = codegen.const_int(width, 1);
    let two = codegen.const_int(width, 2);
    let a = codegen.alloc_slot("a", width, one)?;
    let b = codegen.alloc_slot("b", width, one)?;
    let i = codegen.alloc_slot("i", width, two)?;
    codegen.branch(loop_header)?;

    // Pre-test loop: the comparison is the only exit
    codegen.position_at_end(loop_header);
    let i_val = codegen.load(&i, "i_val")?;
    let keep_going = codegen.compare(IntPredicate::SLT, i_val, n, "keep_going")?;
    codegen.cond_branch(keep_going, loop_body, exit)?;

    codegen.position_at_end(loop_body);
    let a_val = codegen.load(&a, "a_val")?;
    let b_val = codegen.load(&b, "b_val")?;
    let next = codegen.add(a_val, b_val, "next")?;
    codegen.store(&a, b_val)?;
    codegen.store(&b, next)?;
    let i_cur = codegen.load(&i, "i_cur")?;
    let i_next = codegen.add(i_cur, one, "i_next")?;
    codegen.store(&i, i_next)?;
    codegen.branch(loop_header)?;

    codegen.position_at_end(exit);
    let result = codegen.load(&b, "result")?;
    codegen.ret(result)?;

    log::debug!("Built iterative {}", name);
    Ok(function)
}
