//! Algebraic simplification.
//!
//! Identity rewrites on pure binary instructions whose right-hand
//! operand parses as a constant:
//!
//! - `Add`/`Sub` with zero RHS  -> `Assign lhs`
//! - `Mul`/`Div` with one RHS   -> `Assign lhs`
//! - `Mul` with zero RHS        -> `Assign <zero constant of result type>`
//!
//! Types are preserved; no floating-point re-association happens here.

use crate::ir::constant::{self, ConstantData};
use crate::ir::{types, IrInstruction, IrModule, Op, ValueId, ValueKind};
use std::collections::HashMap;

enum Rewrite {
    /// Replace with `Assign` of the untouched left operand
    AssignLhs,
    /// Replace with `Assign` of a fresh all-zero constant
    AssignZero,
}

pub fn run(mut module: IrModule) -> IrModule {
    let constants = parse_constants(&module);
    let mut rewrites = Vec::new();

    for (fi, function) in module.functions.iter().enumerate() {
        for (bi, block) in function.blocks.iter().enumerate() {
            for (ii, instruction) in block.instructions.iter().enumerate() {
                if let Some(rewrite) = classify(instruction, &constants) {
                    rewrites.push((fi, bi, ii, rewrite));
                }
            }
        }
    }

    for (fi, bi, ii, rewrite) in rewrites {
        let instruction = &module.functions[fi].blocks[bi].instructions[ii];
        let result = instruction.result.unwrap_or_default();
        let ty = instruction.ty.clone().unwrap_or_default();
        let lhs = instruction.operands[0];

        let source = match rewrite {
            Rewrite::AssignLhs => lhs,
            Rewrite::AssignZero => {
                let Some(shape) = types::parse_shape(&ty) else {
                    continue;
                };
                let zero = ConstantData::zero(shape);
                module.alloc_value(ValueKind::Constant, ty.clone(), Some(zero.format()))
            }
        };
        module.functions[fi].blocks[bi].instructions[ii] = IrInstruction::new(Op::Assign)
            .with_operands(vec![source])
            .with_result(result, ty);
    }
    module
}

fn parse_constants(module: &IrModule) -> HashMap<ValueId, ConstantData> {
    module
        .values
        .iter()
        .filter(|v| v.kind == ValueKind::Constant)
        .filter_map(|v| {
            let data = constant::parse_typed(v.name.as_deref()?, &v.ty)?;
            Some((v.id, data))
        })
        .collect()
}

fn classify(
    instruction: &IrInstruction,
    constants: &HashMap<ValueId, ConstantData>,
) -> Option<Rewrite> {
    if !instruction.op.is_pure() || instruction.result.is_none() {
        return None;
    }
    if !matches!(instruction.op, Op::Add | Op::Sub | Op::Mul | Op::Div) {
        return None;
    }
    let [_, rhs_id] = instruction.operands.as_slice() else {
        return None;
    };
    let rhs = constants.get(rhs_id)?;

    match instruction.op {
        Op::Add | Op::Sub if rhs.is_splat_of(0.0) => Some(Rewrite::AssignLhs),
        Op::Mul | Op::Div if rhs.is_splat_of(1.0) => Some(Rewrite::AssignLhs),
        Op::Mul if rhs.is_splat_of(0.0) => Some(Rewrite::AssignZero),
        _ => None,
    }
}
