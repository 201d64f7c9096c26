//! JIT compilation and invocation of verified functions.
//!
//! A [`CompiledFunction`] borrows the [`GenerationContext`] it came from, so
//! the compiled artifact is always released before the context that defined
//! it, and nothing can be emitted into the module while it is alive.

use crate::core::error::{CodegenError, CodegenResult, VerificationError};
use crate::llvm::context::{function_name, GenerationContext};
use crate::llvm::signature::{FunctionSignature, IntWidth};
use inkwell::execution_engine::{ExecutionEngine, JitFunction};
use inkwell::targets::{InitializationConfig, Target};
use inkwell::values::FunctionValue;
use inkwell::OptimizationLevel;
use std::marker::PhantomData;

type UnaryI32 = unsafe extern "C" fn(i32) -> i32;
type UnaryI64 = unsafe extern "C" fn(i64) -> i64;

enum JitEntry<'ctx> {
    I32(JitFunction<'ctx, UnaryI32>),
    I64(JitFunction<'ctx, UnaryI64>),
}

/// Native code for one unary integer function.
pub struct CompiledFunction<'g, 'ctx> {
    name: String,
    signature: FunctionSignature,
    entry: JitEntry<'ctx>,
    // Declared after `entry` so the engine outlives the function pointer.
    _engine: ExecutionEngine<'ctx>,
    _context: PhantomData<&'g ()>,
}

impl<'ctx, 'arena> GenerationContext<'ctx, 'arena> {
    /// JIT-compile the module and resolve `function`.
    ///
    /// `function` must have passed [`GenerationContext::verify`] and have a
    /// unary signature. MCJIT compiles the whole module, so every other
    /// function in it is checked too and the first malformed one is
    /// reported. The module can only be handed to one engine; a second call
    /// reports [`CodegenError::BackendUnavailable`].
    pub fn compile(
        &self,
        function: FunctionValue<'ctx>,
        opt_level: OptimizationLevel,
    ) -> CodegenResult<CompiledFunction<'_, 'ctx>> {
        let name = function_name(function);
        if !self.is_verified(function) {
            return Err(CodegenError::Unverified { name });
        }

        let signature = self.signature(function)?.clone();
        let width = signature
            .unary_width()
            .ok_or_else(|| CodegenError::SignatureMismatch {
                expected: "fn(iN) -> iN".to_string(),
                found: signature.to_string(),
            })?;

        self.check_module(&name)?;

        ExecutionEngine::link_in_mc_jit();
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|reason| CodegenError::BackendUnavailable { reason })?;

        log::debug!("Compiling {} at {:?}", name, opt_level);
        let engine = self
            .module
            .create_jit_execution_engine(opt_level)
            .map_err(|err| CodegenError::BackendUnavailable {
                reason: err.to_string(),
            })?;

        let not_found = |_| CodegenError::FunctionNotFound { name: name.clone() };
        // SAFETY: the function was declared with `signature`, whose unary
        // width selects the matching native function type.
        let entry = unsafe {
            match width {
                IntWidth::I32 => JitEntry::I32(engine.get_function::<UnaryI32>(&name).map_err(not_found)?),
                IntWidth::I64 => JitEntry::I64(engine.get_function::<UnaryI64>(&name).map_err(not_found)?),
            }
        };

        Ok(CompiledFunction {
            name,
            signature,
            entry,
            _engine: engine,
            _context: PhantomData,
        })
    }
}

impl<'ctx, 'arena> GenerationContext<'ctx, 'arena> {
    fn check_module(&self, name: &str) -> CodegenResult<()> {
        for other in self.module.get_functions() {
            if !self.is_verified(other) {
                log::debug!("Checking {} before compiling {}", function_name(other), name);
                self.check_function(other)?;
            }
        }

        self.module
            .verify()
            .map_err(|message| VerificationError::Backend {
                function: name.to_string(),
                message: message.to_string(),
            })?;
        Ok(())
    }
}

impl<'g, 'ctx> CompiledFunction<'g, 'ctx> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Call the compiled function with one integer argument.
    pub fn invoke(&self, arg: i64) -> CodegenResult<i64> {
        log::trace!("Invoking {}({})", self.name, arg);

        // SAFETY: the entry was resolved with the declared native type and
        // the engine holding its code lives as long as `self`.
        match &self.entry {
            JitEntry::I32(function) => {
                let arg = i32::try_from(arg).map_err(|_| CodegenError::ArgumentOutOfRange {
                    arg,
                    width: IntWidth::I32,
                })?;
                Ok(i64::from(unsafe { function.call(arg) }))
            }
            JitEntry::I64(function) => Ok(unsafe { function.call(arg) }),
        }
    }

    /// Release the native code. Dropping has the same effect.
    pub fn release(self) {
        log::debug!("Releasing compiled {}", self.name);
    }
}
