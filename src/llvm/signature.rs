//! Function signatures in terms of integer semantic types.

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, FunctionType, IntType};
use std::fmt;

/// Integer semantic type of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I32,
    I64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::I32 => 32,
            IntWidth::I64 => 64,
        }
    }

    /// The backend type for this width.
    pub fn llvm_type(self, context: &Context) -> IntType<'_> {
        match self {
            IntWidth::I32 => context.i32_type(),
            IntWidth::I64 => context.i64_type(),
        }
    }

    /// Whether `value` is representable at this width.
    pub fn fits(self, value: i64) -> bool {
        match self {
            IntWidth::I32 => i32::try_from(value).is_ok(),
            IntWidth::I64 => true,
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.bits())
    }
}

/// Ordered parameter types plus a return type.
///
/// Fields are private so arity and types stay fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    params: Vec<IntWidth>,
    ret: IntWidth,
}

impl FunctionSignature {
    pub fn new(params: Vec<IntWidth>, ret: IntWidth) -> Self {
        Self { params, ret }
    }

    /// `fn(width) -> width`, the shape every `fib` generator needs.
    pub fn unary(width: IntWidth) -> Self {
        Self::new(vec![width], width)
    }

    pub fn params(&self) -> &[IntWidth] {
        &self.params
    }

    pub fn ret(&self) -> IntWidth {
        self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The single width of a unary signature whose parameter and return agree.
    pub fn unary_width(&self) -> Option<IntWidth> {
        match self.params.as_slice() {
            [param] if *param == self.ret => Some(self.ret),
            _ => None,
        }
    }

    /// Lower to a backend function type.
    pub fn llvm_type<'ctx>(&self, context: &'ctx Context) -> FunctionType<'ctx> {
        let params: Vec<BasicMetadataTypeEnum<'ctx>> = self
            .params
            .iter()
            .map(|width| width.llvm_type(context).into())
            .collect();
        self.ret.llvm_type(context).fn_type(&params, false)
    }
}

impl Default for FunctionSignature {
    fn default() -> Self {
        Self::unary(IntWidth::I32)
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}
