// This module gathers the infrastructure shared by both halves of fibjit: the typed error
// taxonomy (reference engine, verification, code generation), the arena-backed generation
// session with its emission statistics, and the run configuration that replaces the
// original demonstration's hard-coded inputs.

//! Core fibjit infrastructure.
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - `ReferenceError`, `VerificationError`, `CodegenError` and the joining `Error`
//!
//! ## Session Management (`session`)
//! - Arena-based allocation using `bumpalo` for analysis results
//! - Per-opcode emission statistics
//!
//! ## Configuration (`config`)
//! - `RunConfig` with the demonstration defaults

pub mod config;
pub mod error;
pub mod session;

pub use config::RunConfig;

pub use error::{
    CodegenError,
    CodegenResult,
    Error,
    ReferenceError,
    ReferenceResult,
    VerificationError,
};

pub use session::{
    GenerationSession,
    SessionStats,
};
