//! Malformed functions are rejected with a verification error, not an abort.

use bumpalo::Bump;
use fibjit::llvm::{FibForm, FunctionSignature, GenerationContext, IntWidth};
use fibjit::{CodegenError, VerificationError};
use inkwell::context::Context;
use inkwell::IntPredicate;
use inkwell::OptimizationLevel;

fn verification_error(result: Result<(), CodegenError>) -> VerificationError {
    match result {
        Err(CodegenError::Verification(err)) => err,
        other => panic!("expected a verification error, got {:?}", other),
    }
}

#[test]
fn test_two_terminators_in_one_block() {
    let _ = env_logger::builder().is_test(true).try_init();

    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "double_ret");
    let function = codegen.declare_function(&FunctionSignature::default(), "f").unwrap();
    let entry = codegen.append_block(function, "entry");
    codegen.position_at_end(entry);

    let n = codegen.param(function, 0).unwrap();
    codegen.ret(n).unwrap();
    codegen.ret(n).unwrap();

    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::MisplacedTerminator {
            block: "entry".to_string()
        }
    );
    assert!(!codegen.is_verified(function));
    assert!(matches!(
        codegen.compile(function, OptimizationLevel::None),
        Err(CodegenError::Unverified { .. })
    ));
}

#[test]
fn test_block_without_terminator() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "no_ret");
    let function = codegen.declare_function(&FunctionSignature::default(), "f").unwrap();
    let entry = codegen.append_block(function, "entry");
    codegen.position_at_end(entry);

    let n = codegen.param(function, 0).unwrap();
    codegen.add(n, n, "twice").unwrap();

    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::MissingTerminator {
            block: "entry".to_string()
        }
    );
}

#[test]
fn test_unreachable_block_is_an_error() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "orphan");
    let function = codegen.declare_function(&FunctionSignature::default(), "f").unwrap();
    let entry = codegen.append_block(function, "entry");
    let orphan = codegen.append_block(function, "orphan");

    let n = codegen.param(function, 0).unwrap();
    codegen.position_at_end(entry);
    codegen.ret(n).unwrap();
    codegen.position_at_end(orphan);
    codegen.ret(n).unwrap();

    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::UnreachableBlock {
            block: "orphan".to_string()
        }
    );
}

#[test]
fn test_branch_into_another_function() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "dangling");
    let sig = FunctionSignature::default();

    let other = codegen.declare_function(&sig, "other").unwrap();
    let foreign = codegen.append_block(other, "foreign");
    codegen.position_at_end(foreign);
    let m = codegen.param(other, 0).unwrap();
    codegen.ret(m).unwrap();

    let function = codegen.declare_function(&sig, "f").unwrap();
    let entry = codegen.append_block(function, "entry");
    codegen.position_at_end(entry);
    codegen.branch(foreign).unwrap();

    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::DanglingBranch {
            block: "entry".to_string(),
            target: "foreign".to_string()
        }
    );
}

#[test]
fn test_use_not_dominated_by_definition() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "dominance");
    let function = codegen
        .declare_function(&FunctionSignature::unary(IntWidth::I64), "f")
        .unwrap();
    let entry = codegen.append_block(function, "entry");
    let then_block = codegen.append_block(function, "then");
    let else_block = codegen.append_block(function, "else");

    codegen.position_at_end(entry);
    let n = codegen.param(function, 0).unwrap();
    let zero = codegen.const_int(IntWidth::I64, 0);
    let positive = codegen.compare(IntPredicate::SGT, n, zero, "positive").unwrap();
    codegen.cond_branch(positive, then_block, else_block).unwrap();

    codegen.position_at_end(then_block);
    let doubled = codegen.add(n, n, "doubled").unwrap();
    codegen.ret(doubled).unwrap();

    // `doubled` is defined in `then` and does not dominate `else`.
    codegen.position_at_end(else_block);
    codegen.ret(doubled).unwrap();

    match verification_error(codegen.verify(function)) {
        VerificationError::Backend { function, message } => {
            assert_eq!(function, "f");
            assert!(message.contains("dominate"), "unexpected message: {}", message);
        }
        other => panic!("expected a backend verification error, got {:?}", other),
    }
}

#[test]
fn test_declaration_without_body() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "decl");
    let function = codegen.declare_function(&FunctionSignature::default(), "f").unwrap();

    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::EmptyBody {
            function: "f".to_string()
        }
    );
}

/// `else` returns a value defined only in `then`.
fn build_non_dominating<'ctx>(codegen: &mut GenerationContext<'ctx, '_>, name: &str) {
    let function = codegen.declare_function(&FunctionSignature::default(), name).unwrap();
    let entry = codegen.append_block(function, "entry");
    let then_block = codegen.append_block(function, "then");
    let else_block = codegen.append_block(function, "else");

    codegen.position_at_end(entry);
    let n = codegen.param(function, 0).unwrap();
    let zero = codegen.const_int(IntWidth::I32, 0);
    let positive = codegen.compare(IntPredicate::SGT, n, zero, "positive").unwrap();
    codegen.cond_branch(positive, then_block, else_block).unwrap();

    codegen.position_at_end(then_block);
    let doubled = codegen.add(n, n, "doubled").unwrap();
    codegen.ret(doubled).unwrap();

    codegen.position_at_end(else_block);
    codegen.ret(doubled).unwrap();
}

#[test]
fn test_unverified_sibling_blocks_compile() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "sibling");
    let sig = FunctionSignature::default();

    let fib = FibForm::Recursive.build(&mut codegen, &sig, "fib").unwrap();
    codegen.verify(fib).unwrap();

    let g = codegen.declare_function(&sig, "g").unwrap();
    let entry = codegen.append_block(g, "g_entry");
    codegen.position_at_end(entry);
    let n = codegen.param(g, 0).unwrap();
    codegen.add(n, n, "twice").unwrap();

    assert!(codegen.is_verified(fib));
    match codegen.compile(fib, OptimizationLevel::None) {
        Err(CodegenError::Verification(err)) => assert_eq!(
            err,
            VerificationError::MissingTerminator {
                block: "g_entry".to_string()
            }
        ),
        Err(other) => panic!("expected a verification error, got {:?}", other),
        Ok(_) => panic!("compiled a module with an unterminated block"),
    }
}

#[test]
fn test_change_after_verify_requires_verify_again() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "changed");
    let function = codegen.declare_function(&FunctionSignature::default(), "f").unwrap();
    let entry = codegen.append_block(function, "entry");
    codegen.position_at_end(entry);
    let n = codegen.param(function, 0).unwrap();
    codegen.ret(n).unwrap();
    codegen.verify(function).unwrap();

    // A second terminator after the function was verified.
    codegen.ret(n).unwrap();

    assert!(!codegen.is_verified(function));
    assert!(matches!(
        codegen.compile(function, OptimizationLevel::None),
        Err(CodegenError::Unverified { .. })
    ));
    assert_eq!(
        verification_error(codegen.verify(function)),
        VerificationError::MisplacedTerminator {
            block: "entry".to_string()
        }
    );
}

#[test]
fn test_broken_sibling_is_blamed_by_name() {
    let context = Context::create();
    let arena = Bump::new();
    let mut codegen = GenerationContext::new(&context, &arena, "blame");

    let good = FibForm::Iterative
        .build(&mut codegen, &FunctionSignature::default(), "good")
        .unwrap();
    build_non_dominating(&mut codegen, "bad");
    let bad = codegen.function("bad").unwrap();

    assert!(codegen.verify(good).is_ok());
    match verification_error(codegen.verify(bad)) {
        VerificationError::Backend { function, .. } => assert_eq!(function, "bad"),
        other => panic!("expected a backend verification error, got {:?}", other),
    }

    match codegen.compile(good, OptimizationLevel::None) {
        Err(CodegenError::Verification(VerificationError::Backend { function, .. })) => {
            assert_eq!(function, "bad")
        }
        Err(other) => panic!("expected a backend verification error, got {:?}", other),
        Ok(_) => panic!("compiled a module with a malformed function"),
    }
}
