//! fibjit - Fibonacci reference strategies and a JIT-compiled `fib`.
//!
//! Two independent halves that share no state:
//!
//! - [`reference`] computes Fibonacci numbers directly with four strategies
//!   (iterative, naive recursive, memoized recursive, memoized iterative),
//!   used as the correctness oracle and for timing comparison.
//! - [`llvm`] builds `fib` as LLVM IR, in iterative and recursive form,
//!   verifies it and runs it through the MCJIT execution engine.
//!
//! # Primary Usage
//!
//! ```ignore
//! use fibjit::llvm::{jit_fib, FibForm, IntWidth};
//! use fibjit::reference::fib_iterative;
//! use inkwell::OptimizationLevel;
//!
//! let run = jit_fib(FibForm::Recursive, IntWidth::I32, 30, OptimizationLevel::None, false)?;
//! assert_eq!(run.value as u64, fib_iterative(30)?);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Errors, generation session, run configuration
//! - [`reference`] - Numeric reference engine and timing
//! - [`llvm`] - Generation context, generators, analysis, JIT engine

pub mod core;
pub mod llvm;
pub mod reference;

pub use crate::core::{
    CodegenError, CodegenResult, Error, GenerationSession, ReferenceError, ReferenceResult,
    RunConfig, SessionStats, VerificationError,
};
pub use llvm::{
    jit_fib, CompiledFunction, FibForm, FunctionSignature, GenerationContext, IntWidth, JitRun,
    MutableSlot,
};
pub use reference::{
    fib_iterative, fib_memoized_iterative, fib_memoized_recursive, fib_recursive_naive, Strategy,
};
