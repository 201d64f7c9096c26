//! Addressable integer slots for loop-carried variables.
//!
//! SSA values cannot be rebound, so a mutable local is an `alloca` read and
//! written through explicit loads and stores. LLVM's mem2reg would turn these
//! back into registers, but no passes are run here.

use super::context::GenerationContext;
use super::signature::IntWidth;
use crate::core::error::CodegenResult;
use inkwell::values::{IntValue, PointerValue};

/// A named storage location holding one integer.
#[derive(Debug, Clone)]
pub struct MutableSlot<'ctx> {
    name: String,
    ptr: PointerValue<'ctx>,
    width: IntWidth,
}

impl<'ctx> MutableSlot<'ctx> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }
}

impl<'ctx, 'arena> GenerationContext<'ctx, 'arena> {
    /// Allocate a slot at the current position and store `init` into it.
    ///
    /// Call this from the entry block, once per variable.
    pub fn alloc_slot(
        &mut self,
        name: &str,
        width: IntWidth,
        init: IntValue<'ctx>,
    ) -> CodegenResult<MutableSlot<'ctx>> {
        self.record("alloca", name);
        let ptr = self
            .builder()
            .build_alloca(width.llvm_type(self.context()), name)?;

        let slot = MutableSlot {
            name: name.to_string(),
            ptr,
            width,
        };
        self.store(&slot, init)?;
        Ok(slot)
    }

    pub fn load(&mut self, slot: &MutableSlot<'ctx>, name: &str) -> CodegenResult<IntValue<'ctx>> {
        self.record("load", name);
        let value = self
            .builder()
            .build_load(slot.width.llvm_type(self.context()), slot.ptr, name)?;
        Ok(value.into_int_value())
    }

    pub fn store(&mut self, slot: &MutableSlot<'ctx>, value: IntValue<'ctx>) -> CodegenResult<()> {
        self.record("store", &slot.name);
        self.builder().build_store(slot.ptr, value)?;
        Ok(())
    }
}
