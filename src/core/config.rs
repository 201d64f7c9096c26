//! Run configuration shared by the library entry points and the binary.
//!
//! The original demonstration hard-coded its inputs (n=50 for the reference
//! engine, n=30 for generated functions); here they are plain fields that the
//! command line can override.

use crate::llvm::signature::IntWidth;
use crate::llvm::FibForm;
use inkwell::OptimizationLevel;

/// Input for the numeric reference engine runs.
pub const DEFAULT_REFERENCE_N: u32 = 50;

/// Input for the generated functions.
pub const DEFAULT_JIT_N: i64 = 30;

/// Largest n the naive recursive strategy is run for.
pub const DEFAULT_NAIVE_LIMIT: u32 = 40;

/// Everything a full run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub reference_n: u32,
    pub naive_limit: u32,
    pub jit_n: i64,
    pub width: IntWidth,
    pub forms: Vec<FibForm>,
    pub opt_level: OptimizationLevel,
    pub dump_ir: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference_n: DEFAULT_REFERENCE_N,
            naive_limit: DEFAULT_NAIVE_LIMIT,
            jit_n: DEFAULT_JIT_N,
            width: IntWidth::I32,
            forms: vec![FibForm::Iterative, FibForm::Recursive],
            opt_level: OptimizationLevel::None,
            dump_ir: false,
        }
    }
}

impl RunConfig {
    /// Whether the naive recursive strategy should run for `reference_n`.
    pub fn runs_naive(&self) -> bool {
        self.reference_n <= self.naive_limit
    }
}

/// Map a numeric `-O` style level onto the backend's optimization levels.
pub fn opt_level_from_u8(level: u8) -> OptimizationLevel {
    match level {
        0 => OptimizationLevel::None,
        1 => OptimizationLevel::Less,
        2 => OptimizationLevel::Default,
        _ => OptimizationLevel::Aggressive,
    }
}
