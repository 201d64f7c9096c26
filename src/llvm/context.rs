// This module implements GenerationContext, the explicitly owned replacement for the
// process-wide LLVM context/module/builder handles of the original demonstration. A
// GenerationContext borrows a caller-created inkwell Context and a bumpalo arena, creates
// its own module and builder, and exposes the small instruction vocabulary the generators
// need: integer compare/add/sub, branches, returns, calls, and (in slot.rs) mutable slots.
// Every emission goes through the session so statistics stay accurate, and every inkwell
// BuilderError is converted into a CodegenError. Function declarations are registered by
// name before any body is built so recursive generators can call the function they are
// defining, and redeclaring a name is rejected instead of letting LLVM invent a shadow
// symbol. verify() runs the structural checks from function_analysis followed by LLVM's
// per-function verifier and marks the function as ready for compile() (see engine.rs).
// Emitting into a verified function, or appending a block to it, drops that mark again.

//! Explicit generation context over an LLVM module and builder.

use crate::core::error::{CodegenError, CodegenResult, VerificationError};
use crate::core::session::{GenerationSession, SessionStats};
use crate::llvm::function_analysis::{FunctionAnalysis, FunctionAnalyzer};
use crate::llvm::signature::{FunctionSignature, IntWidth};
use bumpalo::Bump;
use hashbrown::{HashMap, HashSet};
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{BasicMetadataValueEnum, FunctionValue, IntValue};
use inkwell::IntPredicate;

/// Owns the module and builder for one generation run.
///
/// Must not be shared between concurrent generator invocations; every
/// emitting method takes `&mut self`.
pub struct GenerationContext<'ctx, 'arena> {
    context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    builder: Builder<'ctx>,
    session: GenerationSession<'arena>,
    signatures: HashMap<String, FunctionSignature>,
    verified: HashSet<String>,
}

impl<'ctx, 'arena> GenerationContext<'ctx, 'arena> {
    /// Create a module named `module_name` in `context`.
    pub fn new(context: &'ctx Context, arena: &'arena Bump, module_name: &str) -> Self {
        log::debug!("Creating generation context for module '{}'", module_name);

        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            session: GenerationSession::new(arena),
            signatures: HashMap::new(),
            verified: HashSet::new(),
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.context
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    pub fn session(&self) -> &GenerationSession<'arena> {
        &self.session
    }

    pub fn stats(&self) -> &SessionStats {
        self.session.stats()
    }

    /// Declare `name` with `signature` so it can be called before its body exists.
    pub fn declare_function(
        &mut self,
        signature: &FunctionSignature,
        name: &str,
    ) -> CodegenResult<FunctionValue<'ctx>> {
        if self.module.get_function(name).is_some() {
            return Err(CodegenError::DuplicateFunction {
                name: name.to_string(),
            });
        }

        let function = self
            .module
            .add_function(name, signature.llvm_type(self.context), None);

        log::debug!("Declared {} {}", name, signature);
        self.signatures.insert(name.to_string(), signature.clone());
        self.session.record_function_declared(name);

        Ok(function)
    }

    /// Look up a previously declared function.
    pub fn function(&self, name: &str) -> CodegenResult<FunctionValue<'ctx>> {
        self.module
            .get_function(name)
            .ok_or_else(|| CodegenError::FunctionNotFound {
                name: name.to_string(),
            })
    }

    /// Signature a function was declared with.
    pub fn signature(&self, function: FunctionValue<'ctx>) -> CodegenResult<&FunctionSignature> {
        let name = function_name(function);
        self.signatures
            .get(&name)
            .ok_or(CodegenError::FunctionNotFound { name })
    }

    pub fn append_block(&mut self, function: FunctionValue<'ctx>, name: &str) -> BasicBlock<'ctx> {
        self.session.record_block_appended();
        self.verified.remove(&function_name(function));
        self.context.append_basic_block(function, name)
    }

    pub fn position_at_end(&self, block: BasicBlock<'ctx>) {
        self.builder.position_at_end(block);
    }

    /// Function owning the block the builder is positioned in.
    pub fn building(&self) -> Option<FunctionValue<'ctx>> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
    }

    /// The `index`-th parameter as an integer value.
    pub fn param(&self, function: FunctionValue<'ctx>, index: u32) -> CodegenResult<IntValue<'ctx>> {
        function
            .get_nth_param(index)
            .map(|value| value.into_int_value())
            .ok_or(CodegenError::MissingParameter { index })
    }

    /// Signed integer constant of the given width.
    pub fn const_int(&self, width: IntWidth, value: i64) -> IntValue<'ctx> {
        width.llvm_type(self.context).const_int(value as u64, true)
    }

    pub fn compare(
        &mut self,
        predicate: IntPredicate,
        lhs: IntValue<'ctx>,
        rhs: IntValue<'ctx>,
        name: &str,
    ) -> CodegenResult<IntValue<'ctx>> {
        self.record("icmp", name);
        Ok(self.builder.build_int_compare(predicate, lhs, rhs, name)?)
    }

    pub fn add(&mut self, lhs: IntValue<'ctx>, rhs: IntValue<'ctx>, name: &str) -> CodegenResult<IntValue<'ctx>> {
        self.record("add", name);
        Ok(self.builder.build_int_add(lhs, rhs, name)?)
    }

    pub fn sub(&mut self, lhs: IntValue<'ctx>, rhs: IntValue<'ctx>, name: &str) -> CodegenResult<IntValue<'ctx>> {
        self.record("sub", name);
        Ok(self.builder.build_int_sub(lhs, rhs, name)?)
    }

    pub fn branch(&mut self, target: BasicBlock<'ctx>) -> CodegenResult<()> {
        self.record("br", "");
        self.builder.build_unconditional_branch(target)?;
        Ok(())
    }

    pub fn cond_branch(
        &mut self,
        condition: IntValue<'ctx>,
        then_block: BasicBlock<'ctx>,
        else_block: BasicBlock<'ctx>,
    ) -> CodegenResult<()> {
        self.record("condbr", "");
        self.builder
            .build_conditional_branch(condition, then_block, else_block)?;
        Ok(())
    }

    pub fn ret(&mut self, value: IntValue<'ctx>) -> CodegenResult<()> {
        self.record("ret", "");
        self.builder.build_return(Some(&value))?;
        Ok(())
    }

    /// Call `callee`, which must return an integer.
    pub fn call(
        &mut self,
        callee: FunctionValue<'ctx>,
        args: &[IntValue<'ctx>],
        name: &str,
    ) -> CodegenResult<IntValue<'ctx>> {
        self.record("call", name);
        if self.building() == Some(callee) {
            self.session.record_self_call();
        }

        let args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|&arg| arg.into()).collect();
        let call_site = self.builder.build_call(callee, &args, name)?;

        call_site
            .try_as_basic_value()
            .left()
            .map(|value| value.into_int_value())
            .ok_or_else(|| CodegenError::SignatureMismatch {
                expected: "integer return".to_string(),
                found: "void".to_string(),
            })
    }

    pub(crate) fn builder(&self) -> &Builder<'ctx> {
        &self.builder
    }

    pub(crate) fn record(&mut self, opcode: &'static str, name: &str) {
        log::trace!("emit {} {}", opcode, name);
        self.session.record_instruction_emitted(opcode);
        if let Some(function) = self.building() {
            self.verified.remove(&function_name(function));
        }
    }

    /// Build the control-flow and call-graph summary for `function`.
    pub fn analyze(&self, function: FunctionValue<'ctx>) -> CodegenResult<FunctionAnalysis<'ctx, 'arena>> {
        FunctionAnalyzer::new(self.session.arena(), function).analyze()
    }

    /// Check that `function` is well formed.
    ///
    /// Structural problems (terminators, reachability) are reported with the
    /// offending block; everything else LLVM's verifier rejects is reported
    /// with its message. Only `function` itself decides the outcome, other
    /// functions in the module may still be malformed. Never aborts the process.
    pub fn verify(&mut self, function: FunctionValue<'ctx>) -> CodegenResult<()> {
        let name = function_name(function);
        log::debug!("Verifying {}", name);

        let analysis = self.check_function(function)?;

        log::debug!(
            "{} verified: {} blocks, {} instructions, {} self-calls",
            name,
            analysis.blocks.len(),
            analysis.instruction_count,
            analysis.self_call_count()
        );
        self.verified.insert(name);
        Ok(())
    }

    /// Structural checks followed by LLVM's verifier, scoped to `function`.
    pub(crate) fn check_function(
        &self,
        function: FunctionValue<'ctx>,
    ) -> CodegenResult<FunctionAnalysis<'ctx, 'arena>> {
        let analysis = self.analyze(function)?;
        analysis.check_structure()?;

        if !function.verify(false) {
            // The function verifier reports no text, the module verifier does.
            let message = match self.module.verify() {
                Err(message) => message.to_string(),
                Ok(()) => "rejected by the LLVM verifier".to_string(),
            };
            return Err(VerificationError::Backend {
                function: function_name(function),
                message,
            }
            .into());
        }

        Ok(analysis)
    }

    /// Whether `function` passed [`GenerationContext::verify`] and has not
    /// been changed since.
    pub fn is_verified(&self, function: FunctionValue<'ctx>) -> bool {
        self.verified.contains(&function_name(function))
    }

    /// Textual IR of the whole module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }
}

/// Owned name of an LLVM function.
pub fn function_name(function: FunctionValue<'_>) -> String {
    function.get_name().to_string_lossy().into_owned()
}

/// Owned name of an LLVM basic block.
pub fn block_name(block: BasicBlock<'_>) -> String {
    block.get_name().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "dup");
        let sig = FunctionSignature::default();

        gen.declare_function(&sig, "fib").unwrap();
        let err = gen.declare_function(&sig, "fib").unwrap_err();

        assert!(matches!(err, CodegenError::DuplicateFunction { ref name } if name == "fib"));
        assert_eq!(gen.module().get_functions().count(), 1);
        assert_eq!(gen.stats().functions_declared, 1);
    }

    #[test]
    fn test_function_lookup() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "lookup");
        let sig = FunctionSignature::unary(IntWidth::I64);

        let declared = gen.declare_function(&sig, "f").unwrap();
        assert_eq!(gen.function("f").unwrap(), declared);
        assert_eq!(gen.signature(declared).unwrap(), &sig);
        assert!(matches!(
            gen.function("g"),
            Err(CodegenError::FunctionNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_parameter() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "params");
        let function = gen.declare_function(&FunctionSignature::default(), "f").unwrap();

        assert!(gen.param(function, 0).is_ok());
        assert!(matches!(
            gen.param(function, 1),
            Err(CodegenError::MissingParameter { index: 1 })
        ));
    }

    #[test]
    fn test_emission_is_counted() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "identity");
        let function = gen.declare_function(&FunctionSignature::default(), "id").unwrap();
        let entry = gen.append_block(function, "entry");
        gen.position_at_end(entry);

        let n = gen.param(function, 0).unwrap();
        let zero = gen.const_int(IntWidth::I32, 0);
        let sum = gen.add(n, zero, "sum").unwrap();
        gen.ret(sum).unwrap();

        assert_eq!(gen.stats().count("add"), 1);
        assert_eq!(gen.stats().count("ret"), 1);
        assert_eq!(gen.stats().blocks_appended, 1);
        assert!(gen.verify(function).is_ok());
        assert!(gen.is_verified(function));
        assert!(gen.print_ir().contains("define i32 @id(i32"));
    }

    #[test]
    fn test_self_call_follows_insertion_block() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "calls");
        let sig = FunctionSignature::default();
        let f = gen.declare_function(&sig, "f").unwrap();
        let g = gen.declare_function(&sig, "g").unwrap();

        // `g` was declared last, but the builder is inside `f`.
        let f_entry = gen.append_block(f, "entry");
        gen.position_at_end(f_entry);
        assert_eq!(gen.building(), Some(f));
        let n = gen.param(f, 0).unwrap();
        gen.call(f, &[n], "again").unwrap();
        assert_eq!(gen.stats().self_calls, 1);

        let g_entry = gen.append_block(g, "entry");
        gen.position_at_end(g_entry);
        let m = gen.param(g, 0).unwrap();
        gen.call(f, &[m], "other").unwrap();
        assert_eq!(gen.stats().self_calls, 1);
        assert_eq!(gen.stats().count("call"), 2);
    }

    #[test]
    fn test_emission_after_verify_clears_mark() {
        let context = Context::create();
        let arena = Bump::new();
        let mut gen = GenerationContext::new(&context, &arena, "stale");
        let function = gen.declare_function(&FunctionSignature::default(), "f").unwrap();
        let entry = gen.append_block(function, "entry");
        gen.position_at_end(entry);
        let n = gen.param(function, 0).unwrap();
        gen.ret(n).unwrap();

        gen.verify(function).unwrap();
        assert!(gen.is_verified(function));

        gen.append_block(function, "later");
        assert!(!gen.is_verified(function));

        gen.verify(function).unwrap_err();
        assert!(!gen.is_verified(function));
    }
}
