// This module defines the error taxonomy for fibjit using the thiserror crate. Every path
// that the original demonstration handled with an abort is a typed value here:
// ReferenceError covers the numeric reference engine (storage reservation failures,
// undersized memo caches, u64 overflow), VerificationError covers malformed generated
// functions (missing or misplaced terminators, unreachable blocks, and anything LLVM's own
// verifier rejects), and CodegenError covers the generation/JIT lifecycle (builder failures,
// duplicate declarations, backend unavailability, signature and argument mismatches).
// The crate-level Error joins both halves for the binary, which is the only place where
// an error becomes a failing exit status.

//! Error types for fibjit.
//!
//! Using thiserror for more idiomatic error handling.

use crate::llvm::signature::IntWidth;
use inkwell::builder::BuilderError;
use thiserror::Error;

/// Errors raised by the numeric reference engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Failed to reserve storage for {entries} entries")]
    Allocation { entries: usize },

    #[error("Memo cache of {len} entries is too small for fib({n})")]
    CacheTooSmall { n: u32, len: usize },

    #[error("fib({n}) does not fit in 64 bits")]
    Overflow { n: u32 },
}

/// Structural problems found in a generated function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Block '{block}' does not end in a terminator")]
    MissingTerminator { block: String },

    #[error("Block '{block}' has a terminator before its last instruction")]
    MisplacedTerminator { block: String },

    #[error("Block '{block}' is unreachable from the entry block")]
    UnreachableBlock { block: String },

    #[error("Block '{block}' branches to '{target}', which is not in this function")]
    DanglingBranch { block: String, target: String },

    #[error("Function '{function}' has no body")]
    EmptyBody { function: String },

    #[error("LLVM rejected function '{function}': {message}")]
    Backend { function: String, message: String },
}

/// Errors raised while generating, compiling or invoking a function.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("Function '{name}' must be verified before it is compiled")]
    Unverified { name: String },

    #[error("Execution backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("Instruction builder failed: {0}")]
    Builder(#[from] BuilderError),

    #[error("Function '{name}' is already declared in this module")]
    DuplicateFunction { name: String },

    #[error("Function not found: {name}")]
    FunctionNotFound { name: String },

    #[error("Signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch { expected: String, found: String },

    #[error("Argument {arg} does not fit in {width}")]
    ArgumentOutOfRange { arg: i64, width: IntWidth },

    #[error("Function has no parameter at index {index}")]
    MissingParameter { index: u32 },
}

/// Top-level error for callers that drive both halves of the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// Result type alias for reference engine operations.
pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Result type alias for code generation operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_too_small_message() {
        let err = ReferenceError::CacheTooSmall { n: 10, len: 4 };
        assert_eq!(err.to_string(), "Memo cache of 4 entries is too small for fib(10)");
    }

    #[test]
    fn test_verification_error_converts_into_codegen_error() {
        let err: CodegenError = VerificationError::UnreachableBlock {
            block: "orphan".to_string(),
        }
        .into();
        assert!(matches!(err, CodegenError::Verification(_)));
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn test_argument_out_of_range_names_width() {
        let err = CodegenError::ArgumentOutOfRange {
            arg: i64::MAX,
            width: IntWidth::I32,
        };
        assert!(err.to_string().ends_with("does not fit in i32"));
    }
}
