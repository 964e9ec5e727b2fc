//! Copy propagation.
//!
//! A CFG-aware forward dataflow over `valueId -> representative` maps.
//! Single-operand `Assign` instructions introduce copies; any other
//! defining instruction kills its result. Block entry state is the
//! intersection of all predecessor exits: an entry survives a merge only
//! when every predecessor carries it with the identical representative.
//! Operands are then rewritten to the representative in effect at their
//! program point. The `Assign` instructions themselves stay; a later
//! `dce` pass deletes the dead ones.

use super::cfg::Cfg;
use crate::ir::{IrFunction, IrModule, Op, ValueId};
use std::collections::{HashMap, VecDeque};

type CopyMap = HashMap<ValueId, ValueId>;

pub fn run(mut module: IrModule) -> IrModule {
    for function in &mut module.functions {
        propagate_function(function);
    }
    module
}

fn propagate_function(function: &mut IrFunction) {
    let cfg = Cfg::build(function);
    let block_count = function.blocks.len();
    if block_count == 0 {
        return;
    }

    // Fixed point over block exit states. `None` is the optimistic
    // "not yet computed" top element so loop back-edges do not clobber
    // the merge before their source has been visited.
    let mut outs: Vec<Option<CopyMap>> = vec![None; block_count];
    let mut worklist: VecDeque<usize> = (0..block_count).collect();
    while let Some(b) = worklist.pop_front() {
        let entry = merge_predecessors(&cfg, &outs, b);
        let exit = transfer_block(function, b, entry);
        if outs[b].as_ref() != Some(&exit) {
            outs[b] = Some(exit);
            for &s in &cfg.successors[b] {
                if !worklist.contains(&s) {
                    worklist.push_back(s);
                }
            }
        }
    }

    // Rewrite operands using the converged entry states
    for b in 0..block_count {
        let mut state = merge_predecessors(&cfg, &outs, b);
        for instruction in &mut function.blocks[b].instructions {
            for operand in &mut instruction.operands {
                *operand = resolve(&state, *operand);
            }
            apply_transfer(&mut state, &instruction.op, instruction.result, &instruction.operands);
        }
    }
}

/// Intersection-with-agreement over predecessor exit maps
fn merge_predecessors(cfg: &Cfg, outs: &[Option<CopyMap>], block: usize) -> CopyMap {
    let mut computed = cfg.predecessors[block]
        .iter()
        .filter_map(|&p| outs[p].as_ref());
    let Some(first) = computed.next() else {
        return CopyMap::new();
    };
    let mut merged = first.clone();
    for map in computed {
        merged.retain(|k, v| map.get(k) == Some(v));
    }
    merged
}

fn transfer_block(function: &IrFunction, block: usize, mut state: CopyMap) -> CopyMap {
    for instruction in &function.blocks[block].instructions {
        apply_transfer(&mut state, &instruction.op, instruction.result, &instruction.operands);
    }
    state
}

fn apply_transfer(state: &mut CopyMap, op: &Op, result: Option<ValueId>, operands: &[ValueId]) {
    let Some(result) = result else {
        return;
    };
    if *op == Op::Assign && operands.len() == 1 {
        let representative = resolve(state, operands[0]);
        state.insert(result, representative);
    } else {
        state.remove(&result);
    }
}

/// Follow the copy chain to its representative
fn resolve(state: &CopyMap, mut value: ValueId) -> ValueId {
    let mut hops = 0;
    while let Some(&next) = state.get(&value) {
        if next == value || hops > state.len() {
            break;
        }
        value = next;
        hops += 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::{FunctionBuilder, ModuleBuilder};
    use crate::ir::ValueKind;

    #[test]
    fn straight_line_copies_propagate() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, "float").id();
        let a = builder.value(ValueKind::Temp, "float").id();
        let b = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .block("entry", |blk| {
                blk.assign(p, a, "float");
                blk.assign(a, b, "float");
                blk.ret(Some(b));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        // Both copies resolve to the original parameter
        assert_eq!(instructions[1].operands, vec![p]);
        assert_eq!(instructions[2].operands, vec![p]);
    }

    #[test]
    fn disagreeing_branches_do_not_propagate() {
        // Scenario: v4 is copied from v3 only on the else path, so the
        // merge keeps v4 in the then path's Return.
        let mut builder = ModuleBuilder::new("ps_2_0");
        let cond = builder.value(ValueKind::Parameter, "bool").id();
        let c10 = builder.constant("float", "10");
        let c20 = builder.constant("float", "20");
        let v4 = builder.value(ValueKind::Temp, "float").id();
        let _ = c10;
        let function = FunctionBuilder::new("main", "float")
            .parameter(cond)
            .block("entry", |blk| {
                blk.branch_cond(cond, "then", "else");
            })
            .block("then", |blk| {
                blk.ret(Some(v4));
            })
            .block("else", |blk| {
                blk.assign(c20, v4, "float");
                blk.ret(Some(v4));
            })
            .build();
        let module = run(builder.function(function).build());

        let then_ret = &module.functions[0].blocks[1].instructions[0];
        assert_eq!(then_ret.operands, vec![v4]);
        let else_ret = &module.functions[0].blocks[2].instructions[1];
        assert_eq!(else_ret.operands, vec![c20]);
    }

    #[test]
    fn agreeing_predecessors_propagate_into_merge() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let cond = builder.value(ValueKind::Parameter, "bool").id();
        let c = builder.constant("float", "1");
        let v = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(cond)
            .block("entry", |blk| {
                blk.assign(c, v, "float");
                blk.branch_cond(cond, "then", "else");
            })
            .block("then", |blk| {
                blk.branch("merge");
            })
            .block("else", |blk| {
                blk.branch("merge");
            })
            .block("merge", |blk| {
                blk.ret(Some(v));
            })
            .build();
        let module = run(builder.function(function).build());

        let merge_ret = &module.functions[0].blocks[3].instructions[0];
        assert_eq!(merge_ret.operands, vec![c]);
    }

    #[test]
    fn redefinition_kills_the_copy() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, "float").id();
        let q = builder.value(ValueKind::Parameter, "float").id();
        let a = builder.value(ValueKind::Temp, "float").id();
        let b = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .parameter(q)
            .block("entry", |blk| {
                blk.assign(p, a, "float");
                // `a` is killed by a non-copy definition before the use
                blk.binary(Op::Add, q, q, a, "float");
                blk.assign(a, b, "float");
                blk.ret(Some(b));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        assert_eq!(instructions[2].operands, vec![a]);
    }
}
