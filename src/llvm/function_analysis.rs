// This module implements function analysis for generated LLVM functions using arena
// allocation. FunctionAnalyzer consumes itself to produce a FunctionAnalysis stored
// entirely in the generation session arena. The analyzer performs three passes:
// 1) Instruction analysis to count instructions and terminators per block and to record
// call sites together with their callee, which forms the function call graph,
// 2) Successor extraction from each block's terminator to build the control flow graph
// and predecessor counts, 3) Reachability from the entry block. check_structure() turns
// the results into VerificationErrors: a block that does not end in a terminator, a
// terminator in the middle of a block, or a block no path from the entry reaches.
// Unreachable blocks are reported rather than dropped because they always indicate a
// generator bug.

//! Function analyzer that uses arena allocation and consumes itself to produce results.

use crate::core::error::{CodegenError, CodegenResult, VerificationError};
use crate::llvm::context::block_name;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use inkwell::basic_block::BasicBlock;
use inkwell::values::{CallSiteValue, FunctionValue, InstructionOpcode, InstructionValue};

/// Analysis results that own arena-allocated data.
pub struct FunctionAnalysis<'ctx, 'arena> {
    /// Function that was analyzed.
    pub function: FunctionValue<'ctx>,

    /// Blocks in layout order; index 0 is the entry block.
    pub blocks: &'arena [BasicBlock<'ctx>],

    /// Per-block information (indexed by block index).
    pub block_info: &'arena [BlockInfo],

    /// Successor indices array.
    pub successor_indices: &'arena [usize],

    /// Every call instruction in the function.
    pub call_sites: &'arena [CallSite<'ctx>],

    /// Total instruction count.
    pub instruction_count: usize,
}

/// Block information gathered by the analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockInfo {
    /// Index of first successor in successors array.
    pub successor_start: usize,

    /// Number of successors.
    pub successor_count: usize,

    /// Number of predecessors.
    pub predecessor_count: usize,

    /// Number of instructions.
    pub instruction_count: usize,

    /// Number of terminator instructions anywhere in the block.
    pub terminator_count: usize,

    /// Whether the last instruction is a terminator.
    pub ends_in_terminator: bool,

    /// Whether this block has conditional control flow.
    pub is_conditional: bool,

    /// Whether some path from the entry block reaches this block.
    pub reachable: bool,
}

/// A call instruction and what it calls.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'ctx> {
    /// Block containing the call.
    pub block_idx: usize,

    /// Direct callee, `None` for indirect calls.
    pub callee: Option<FunctionValue<'ctx>>,
}

/// Builder that consumes itself to produce analysis results.
pub struct FunctionAnalyzer<'ctx, 'arena> {
    function: FunctionValue<'ctx>,
    blocks: BumpVec<'arena, BasicBlock<'ctx>>,

    // Working data - will be moved to results
    block_info: BumpVec<'arena, BlockInfo>,
    successor_indices: BumpVec<'arena, usize>,
    call_sites: BumpVec<'arena, CallSite<'ctx>>,

    instruction_count: usize,
}

impl<'ctx, 'arena> FunctionAnalyzer<'ctx, 'arena> {
    /// Create a new analyzer that borrows the arena.
    pub fn new(arena: &'arena Bump, function: FunctionValue<'ctx>) -> Self {
        let mut blocks = BumpVec::new_in(arena);
        blocks.extend(function.get_basic_blocks());
        let num_blocks = blocks.len();

        let mut block_info = BumpVec::with_capacity_in(num_blocks, arena);
        block_info.resize(num_blocks, BlockInfo::default());

        Self {
            function,
            blocks,
            block_info,
            successor_indices: BumpVec::with_capacity_in(num_blocks * 2, arena),
            call_sites: BumpVec::new_in(arena),
            instruction_count: 0,
        }
    }

    /// Perform analysis and consume self to produce results.
    pub fn analyze(mut self) -> CodegenResult<FunctionAnalysis<'ctx, 'arena>> {
        // First pass: instructions, terminators, call sites
        self.analyze_instructions();

        // Second pass: block successors
        self.extract_block_successors()?;

        // Third pass: reachability from the entry block
        self.compute_reachability();

        Ok(FunctionAnalysis {
            function: self.function,
            blocks: self.blocks.into_bump_slice(),
            block_info: self.block_info.into_bump_slice(),
            successor_indices: self.successor_indices.into_bump_slice(),
            call_sites: self.call_sites.into_bump_slice(),
            instruction_count: self.instruction_count,
        })
    }

    fn analyze_instructions(&mut self) {
        for block_idx in 0..self.blocks.len() {
            let block = self.blocks[block_idx];
            let mut last: Option<InstructionValue<'ctx>> = None;

            for instruction in block.get_instructions() {
                self.instruction_count += 1;
                self.block_info[block_idx].instruction_count += 1;

                if is_terminator(instruction.get_opcode()) {
                    self.block_info[block_idx].terminator_count += 1;
                }

                if instruction.get_opcode() == InstructionOpcode::Call {
                    let callee = CallSiteValue::try_from(instruction)
                        .ok()
                        .and_then(|call| call.get_called_fn_value());
                    self.call_sites.push(CallSite { block_idx, callee });
                }

                last = Some(instruction);
            }

            self.block_info[block_idx].ends_in_terminator =
                last.is_some_and(|inst| is_terminator(inst.get_opcode()));
        }
    }

    fn find_block_index(&self, from: BasicBlock<'ctx>, target: BasicBlock<'ctx>) -> CodegenResult<usize> {
        self.blocks
            .iter()
            .position(|&b| b == target)
            .ok_or_else(|| {
                CodegenError::Verification(VerificationError::DanglingBranch {
                    block: block_name(from),
                    target: block_name(target),
                })
            })
    }

    fn extract_block_successors(&mut self) -> CodegenResult<()> {
        for block_idx in 0..self.blocks.len() {
            let block = self.blocks[block_idx];

            let Some(terminator) = block.get_terminator() else {
                continue;
            };

            let start = self.successor_indices.len();
            let mut targets: Vec<BasicBlock<'ctx>> = Vec::with_capacity(2);

            match terminator.get_opcode() {
                InstructionOpcode::Br => {
                    if terminator.get_num_operands() == 1 {
                        targets.extend(terminator.get_operand(0).and_then(|op| op.right()));
                    } else {
                        self.block_info[block_idx].is_conditional = true;
                        // True target is operand 2, false target operand 1
                        targets.extend(terminator.get_operand(2).and_then(|op| op.right()));
                        targets.extend(terminator.get_operand(1).and_then(|op| op.right()));
                    }
                }
                InstructionOpcode::Return | InstructionOpcode::Unreachable => {}
                _ => {
                    // Any other terminator: every block operand is a successor
                    self.block_info[block_idx].is_conditional = true;
                    for i in 0..terminator.get_num_operands() {
                        targets.extend(terminator.get_operand(i).and_then(|op| op.right()));
                    }
                }
            }

            for target in targets {
                let target_idx = self.find_block_index(block, target)?;
                self.successor_indices.push(target_idx);
                self.block_info[target_idx].predecessor_count += 1;
            }

            self.block_info[block_idx].successor_start = start;
            self.block_info[block_idx].successor_count = self.successor_indices.len() - start;
        }

        Ok(())
    }

    fn compute_reachability(&mut self) {
        if self.blocks.is_empty() {
            return;
        }

        let mut worklist = vec![0usize];
        self.block_info[0].reachable = true;

        while let Some(block_idx) = worklist.pop() {
            let info = self.block_info[block_idx];
            for i in info.successor_start..info.successor_start + info.successor_count {
                let succ = self.successor_indices[i];
                if !self.block_info[succ].reachable {
                    self.block_info[succ].reachable = true;
                    worklist.push(succ);
                }
            }
        }
    }
}

fn is_terminator(opcode: InstructionOpcode) -> bool {
    matches!(
        opcode,
        InstructionOpcode::Return
            | InstructionOpcode::Br
            | InstructionOpcode::Switch
            | InstructionOpcode::IndirectBr
            | InstructionOpcode::Invoke
            | InstructionOpcode::Resume
            | InstructionOpcode::Unreachable
    )
}

impl<'ctx, 'arena> FunctionAnalysis<'ctx, 'arena> {
    /// Get successor blocks for a specific block.
    pub fn get_block_successors(&self, block_idx: usize) -> &[usize] {
        match self.block_info.get(block_idx) {
            Some(info) => {
                &self.successor_indices[info.successor_start..info.successor_start + info.successor_count]
            }
            None => &[],
        }
    }

    /// Index of the block called `name`.
    pub fn block_index(&self, name: &str) -> Option<usize> {
        self.blocks
            .iter()
            .position(|&block| block.get_name().to_bytes() == name.as_bytes())
    }

    /// Check if a block has multiple predecessors (is a join block).
    pub fn is_join_block(&self, block_idx: usize) -> bool {
        self.block_info
            .get(block_idx)
            .is_some_and(|info| info.predecessor_count > 1)
    }

    /// Check if a block has conditional control flow.
    pub fn has_conditional_branch(&self, block_idx: usize) -> bool {
        self.block_info
            .get(block_idx)
            .is_some_and(|info| info.is_conditional)
    }

    /// Whether some edge runs from a block at or after `block_idx` back to it.
    pub fn is_loop_header(&self, block_idx: usize) -> bool {
        (block_idx..self.blocks.len()).any(|from| self.get_block_successors(from).contains(&block_idx))
    }

    /// Calls whose callee is the analyzed function itself.
    pub fn self_call_count(&self) -> usize {
        self.call_sites
            .iter()
            .filter(|site| site.callee == Some(self.function))
            .count()
    }

    /// Report the first structural defect, if any.
    pub fn check_structure(&self) -> Result<(), VerificationError> {
        if self.blocks.is_empty() {
            return Err(VerificationError::EmptyBody {
                function: self.function.get_name().to_string_lossy().into_owned(),
            });
        }

        for (block, info) in self.blocks.iter().zip(self.block_info.iter()) {
            if info.terminator_count > 1 || (info.terminator_count == 1 && !info.ends_in_terminator) {
                return Err(VerificationError::MisplacedTerminator {
                    block: block_name(*block),
                });
            }
            if !info.ends_in_terminator {
                return Err(VerificationError::MissingTerminator {
                    block: block_name(*block),
                });
            }
        }

        if let Some((block, _)) = self
            .blocks
            .iter()
            .zip(self.block_info.iter())
            .find(|(_, info)| !info.reachable)
        {
            return Err(VerificationError::UnreachableBlock {
                block: block_name(*block),
            });
        }

        Ok(())
    }
}
