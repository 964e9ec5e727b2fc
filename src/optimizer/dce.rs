//! Dead-code elimination.
//!
//! Deletes pure instructions whose results are never cited as operands,
//! walking each block in reverse so a deleted use immediately exposes
//! its producers. Side-effectful instructions (`Store`, the Sample
//! family, `discard`-tagged ops) are never deleted, and anchor their
//! operand chains.

use crate::ir::{IrModule, ValueId};
use std::collections::HashMap;

pub fn run(mut module: IrModule) -> IrModule {
    // Module-wide operand use counts
    let mut uses: HashMap<ValueId, usize> = HashMap::new();
    for function in &module.functions {
        for block in &function.blocks {
            for instruction in &block.instructions {
                for &operand in &instruction.operands {
                    *uses.entry(operand).or_insert(0) += 1;
                }
            }
        }
    }

    for function in &mut module.functions {
        for block in &mut function.blocks {
            // Reverse of definition order: one pass per block converges
            let mut kept_rev = Vec::with_capacity(block.instructions.len());
            for instruction in block.instructions.drain(..).rev() {
                let dead = instruction.op.is_pure()
                    && !instruction.has_side_effects()
                    && instruction
                        .result
                        .is_some_and(|r| uses.get(&r).copied().unwrap_or(0) == 0);
                if dead {
                    for operand in &instruction.operands {
                        if let Some(count) = uses.get_mut(operand) {
                            *count = count.saturating_sub(1);
                        }
                    }
                } else {
                    kept_rev.push(instruction);
                }
            }
            kept_rev.reverse();
            block.instructions = kept_rev;
        }
    }
    module
}
