//! LLVM code generation for `fib`.
//!
//! This module builds `fib` as LLVM IR through inkwell, verifies it and runs
//! it through the MCJIT execution engine.
//!
//! # Example
//! ```ignore
//! use fibjit::llvm::{FibForm, GenerationContext, FunctionSignature};
//! use bumpalo::Bump;
//! use inkwell::context::Context;
//! use inkwell::OptimizationLevel;
//!
//! let context = Context::create();
//! let arena = Bump::new();
//! let mut codegen = GenerationContext::new(&context, &arena, "fib_module");
//! let fib = FibForm::Recursive.build(&mut codegen, &FunctionSignature::default(), "fib")?;
//! codegen.verify(fib)?;
//! let compiled = codegen.compile(fib, OptimizationLevel::None)?;
//! assert_eq!(compiled.invoke(30)?, 832_040);
//! ```

pub mod context;
pub mod engine;
pub mod function_analysis;
pub mod iterative;
pub mod recursive;
pub mod signature;
pub mod slot;

pub use context::GenerationContext;
pub use engine::CompiledFunction;
pub use function_analysis::{BlockInfo, CallSite, FunctionAnalysis, FunctionAnalyzer};
pub use iterative::build_iterative_fib;
pub use recursive::build_recursive_fib;
pub use signature::{FunctionSignature, IntWidth};
pub use slot::MutableSlot;

use crate::core::error::{CodegenError, CodegenResult};
use bumpalo::Bump;
use inkwell::context::Context;
use inkwell::values::FunctionValue;
use inkwell::OptimizationLevel;
use std::fmt;
use std::time::{Duration, Instant};

/// Which generator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FibForm {
    Iterative,
    Recursive,
}

impl FibForm {
    pub const ALL: [FibForm; 2] = [FibForm::Iterative, FibForm::Recursive];

    pub fn name(self) -> &'static str {
        match self {
            FibForm::Iterative => "iterative",
            FibForm::Recursive => "recursive",
        }
    }

    /// Build this form of `fib` as `name` in `codegen`.
    pub fn build<'ctx>(
        self,
        codegen: &mut GenerationContext<'ctx, '_>,
        signature: &FunctionSignature,
        name: &str,
    ) -> CodegenResult<FunctionValue<'ctx>> {
        match self {
            FibForm::Iterative => build_iterative_fib(codegen, signature, name),
            FibForm::Recursive => build_recursive_fib(codegen, signature, name),
        }
    }
}

impl fmt::Display for FibForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Width shared by the parameter and return of a unary signature.
pub(crate) fn unary_width(signature: &FunctionSignature) -> CodegenResult<IntWidth> {
    signature
        .unary_width()
        .ok_or_else(|| CodegenError::SignatureMismatch {
            expected: "fn(iN) -> iN".to_string(),
            found: signature.to_string(),
        })
}

/// Outcome of one full generate/verify/compile/invoke cycle.
#[derive(Debug, Clone)]
pub struct JitRun {
    pub form: FibForm,
    pub width: IntWidth,
    pub n: i64,
    pub value: i64,
    /// Module IR, when requested.
    pub ir: Option<String>,
    pub compile_time: Duration,
    pub run_time: Duration,
}

impl fmt::Display for JitRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fib({}) = {}", self.n, self.value)
    }
}

/// Generate `fib` in `form`, compile it and evaluate `fib(n)`.
///
/// Owns the whole lifecycle: the compiled artifact is released before the
/// generation context, and both before returning.
pub fn jit_fib(
    form: FibForm,
    width: IntWidth,
    n: i64,
    opt_level: OptimizationLevel,
    capture_ir: bool,
) -> CodegenResult<JitRun> {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "fib_module");
    let signature = FunctionSignature::unary(width);

    let fib = form.build(&mut codegen, &signature, "fib")?;
    codegen.verify(fib)?;
    let ir = capture_ir.then(|| codegen.print_ir());

    let start = Instant::now();
    let compiled = codegen.compile(fib, opt_level)?;
    let compile_time = start.elapsed();

    let start = Instant::now();
    let value = compiled.invoke(n)?;
    let run_time = start.elapsed();

    compiled.release();
    log::info!(
        "{} fib({}) = {} (compile {:?}, run {:?})",
        form,
        n,
        value,
        compile_time,
        run_time
    );
    log::debug!("{}", codegen.stats());

    Ok(JitRun {
        form,
        width,
        n,
        value,
        ir,
        compile_time,
        run_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_names() {
        assert_eq!(FibForm::Iterative.to_string(), "iterative");
        assert_eq!(FibForm::Recursive.to_string(), "recursive");
    }

    #[test]
    fn test_jit_fib_default_input() {
        for form in FibForm::ALL {
            let run = jit_fib(form, IntWidth::I32, 30, OptimizationLevel::None, false).unwrap();
            assert_eq!(run.value, 832_040, "{} form", form);
            assert!(run.ir.is_none());
            assert_eq!(run.to_string(), "fib(30) = 832040");
        }
    }

    #[test]
    fn test_jit_fib_captures_ir() {
        let run = jit_fib(FibForm::Recursive, IntWidth::I64, 10, OptimizationLevel::None, true).unwrap();
        assert_eq!(run.value, 55);
        let ir = run.ir.unwrap();
        assert!(ir.contains("define i64 @fib(i64"));
        assert!(ir.contains("call i64 @fib("));
    }
}
