//! Constant folding.
//!
//! Pure non-terminator instructions whose operands are all parseable
//! constants fold element-wise into a fresh constant value; the
//! instruction becomes an `Assign` referencing it. Division and modulo
//! skip the fold when any divisor element is zero. Single-element
//! operands splat across the result's component count.

use crate::ir::constant::{self, ConstantData};
use crate::ir::{types, IrInstruction, IrModule, Op, ValueId, ValueKind};
use std::collections::HashMap;

struct Fold {
    function: usize,
    block: usize,
    instruction: usize,
    result: ValueId,
    ty: String,
    folded: ConstantData,
}

pub fn run(mut module: IrModule) -> IrModule {
    let constants = parse_constants(&module);
    let mut folds = Vec::new();

    for (fi, function) in module.functions.iter().enumerate() {
        for (bi, block) in function.blocks.iter().enumerate() {
            for (ii, instruction) in block.instructions.iter().enumerate() {
                if let Some(fold) = try_fold(instruction, &constants) {
                    folds.push(Fold {
                        function: fi,
                        block: bi,
                        instruction: ii,
                        result: instruction.result.unwrap_or_default(),
                        ty: instruction.ty.clone().unwrap_or_default(),
                        folded: fold,
                    });
                }
            }
        }
    }

    for fold in folds {
        let id = module.alloc_value(
            ValueKind::Constant,
            fold.ty.clone(),
            Some(fold.folded.format()),
        );
        let replacement = IrInstruction::new(Op::Assign)
            .with_operands(vec![id])
            .with_result(fold.result, fold.ty);
        module.functions[fold.function].blocks[fold.block].instructions[fold.instruction] =
            replacement;
    }
    module
}

/// Parse every `Constant` value's literal text against its declared type
fn parse_constants(module: &IrModule) -> HashMap<ValueId, ConstantData> {
    module
        .values
        .iter()
        .filter(|v| v.kind == ValueKind::Constant)
        .filter_map(|v| {
            let text = v.name.as_deref()?;
            let data = constant::parse_typed(text, &v.ty)?;
            Some((v.id, data))
        })
        .collect()
}

fn try_fold(
    instruction: &IrInstruction,
    constants: &HashMap<ValueId, ConstantData>,
) -> Option<ConstantData> {
    if instruction.terminator || !instruction.op.is_pure() || instruction.result.is_none() {
        return None;
    }
    // Assign is a plain copy; folding it would only rename the constant
    if instruction.op == Op::Assign {
        return None;
    }
    let result_shape = types::parse_shape(instruction.ty.as_deref()?)?;
    let operands: Vec<&ConstantData> = instruction
        .operands
        .iter()
        .map(|id| constants.get(id))
        .collect::<Option<Vec<_>>>()?;

    match instruction.op {
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => {
            let [lhs, rhs] = operands.as_slice() else {
                return None;
            };
            fold_binary(instruction.op.clone(), result_shape, lhs, rhs)
        }
        Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => {
            let [lhs, rhs] = operands.as_slice() else {
                return None;
            };
            fold_elementwise(result_shape, lhs, rhs, |a, b| {
                let holds = match instruction.op {
                    Op::Eq => a == b,
                    Op::Ne => a != b,
                    Op::Lt => a < b,
                    Op::Le => a <= b,
                    Op::Gt => a > b,
                    _ => a >= b,
                };
                Some(f64::from(u8::from(holds)))
            })
        }
        Op::LogicalAnd | Op::LogicalOr => {
            let [lhs, rhs] = operands.as_slice() else {
                return None;
            };
            fold_elementwise(result_shape, lhs, rhs, |a, b| {
                let holds = if instruction.op == Op::LogicalAnd {
                    a != 0.0 && b != 0.0
                } else {
                    a != 0.0 || b != 0.0
                };
                Some(f64::from(u8::from(holds)))
            })
        }
        Op::Swizzle => {
            let [source] = operands.as_slice() else {
                return None;
            };
            fold_swizzle(instruction, result_shape, source)
        }
        _ => None,
    }
}

fn fold_binary(
    op: Op,
    result_shape: types::TypeShape,
    lhs: &ConstantData,
    rhs: &ConstantData,
) -> Option<ConstantData> {
    fold_elementwise(result_shape, lhs, rhs, |a, b| match op {
        Op::Add => Some(a + b),
        Op::Sub => Some(a - b),
        Op::Mul => Some(a * b),
        Op::Div if b != 0.0 => Some(a / b),
        Op::Mod if b != 0.0 => Some(a % b),
        _ => None,
    })
}

/// Apply `f` lane by lane over the result's component count; operands
/// either match that count or splat from a single element.
fn fold_elementwise(
    result_shape: types::TypeShape,
    lhs: &ConstantData,
    rhs: &ConstantData,
    f: impl Fn(f64, f64) -> Option<f64>,
) -> Option<ConstantData> {
    let count = result_shape.component_count();
    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        let a = broadcast(lhs, i, count)?;
        let b = broadcast(rhs, i, count)?;
        elements.push(f(a, b)?);
    }
    Some(ConstantData {
        shape: result_shape,
        elements,
    })
}

fn broadcast(operand: &ConstantData, index: usize, count: usize) -> Option<f64> {
    match operand.elements.len() {
        1 => Some(operand.elements[0]),
        n if n == count => Some(operand.elements[index]),
        _ => None,
    }
}

fn fold_swizzle(
    instruction: &IrInstruction,
    result_shape: types::TypeShape,
    source: &ConstantData,
) -> Option<ConstantData> {
    let lanes = instruction.swizzle_lanes()?;
    if lanes.len() != result_shape.component_count() {
        return None;
    }
    let elements: Vec<f64> = lanes
        .iter()
        .map(|&lane| source.elements.get(lane as usize).copied())
        .collect::<Option<Vec<f64>>>()?;
    Some(ConstantData {
        shape: result_shape,
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::{FunctionBuilder, ModuleBuilder};
    use crate::ir::ValueKind;

    fn fold_module(module: IrModule) -> IrModule {
        run(module)
    }

    #[test]
    fn folds_scalar_addition() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let a = builder.constant("float", "2");
        let b = builder.constant("float", "3");
        let r = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .block("entry", |blk| {
                blk.binary(Op::Add, a, b, r, "float");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        let instruction = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(instruction.op, Op::Assign);
        let folded = module.value(instruction.operands[0]).unwrap();
        assert_eq!(folded.name.as_deref(), Some("5"));
        assert_eq!(folded.ty, "float");
    }

    #[test]
    fn folds_vector_with_splat() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let a = builder.constant("float3", "float3(1,2,3)");
        let b = builder.constant("float", "2");
        let r = builder.value(ValueKind::Temp, "float3").id();
        let function = FunctionBuilder::new("main", "float3")
            .block("entry", |blk| {
                blk.binary(Op::Mul, a, b, r, "float3");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        let instruction = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(instruction.op, Op::Assign);
        let folded = module.value(instruction.operands[0]).unwrap();
        assert_eq!(folded.name.as_deref(), Some("float3(2,4,6)"));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let a = builder.constant("float", "1");
        let b = builder.constant("float", "0");
        let r = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .block("entry", |blk| {
                blk.binary(Op::Div, a, b, r, "float");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        assert_eq!(module.functions[0].blocks[0].instructions[0].op, Op::Div);
    }

    #[test]
    fn folds_comparison_to_bool_text() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let a = builder.constant("float", "1");
        let b = builder.constant("float", "2");
        let r = builder.value(ValueKind::Temp, "bool").id();
        let function = FunctionBuilder::new("main", "bool")
            .block("entry", |blk| {
                blk.binary(Op::Lt, a, b, r, "bool");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        let instruction = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(instruction.op, Op::Assign);
        let folded = module.value(instruction.operands[0]).unwrap();
        assert_eq!(folded.name.as_deref(), Some("true"));
    }

    #[test]
    fn folds_swizzle_of_constant_vector() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let v = builder.constant("float4", "float4(1,2,3,4)");
        let r = builder.value(ValueKind::Temp, "float2").id();
        let function = FunctionBuilder::new("main", "float2")
            .block("entry", |blk| {
                blk.swizzle(v, "wy", r, "float2");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        let instruction = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(instruction.op, Op::Assign);
        let folded = module.value(instruction.operands[0]).unwrap();
        assert_eq!(folded.name.as_deref(), Some("float2(4,2)"));
    }

    #[test]
    fn non_constant_operands_are_left_alone() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let a = builder.constant("float", "2");
        let p = builder.value(ValueKind::Parameter, "float").id();
        let r = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .block("entry", |blk| {
                blk.binary(Op::Add, a, p, r, "float");
                blk.ret(Some(r));
            })
            .build();
        let module = fold_module(builder.function(function).build());

        assert_eq!(module.functions[0].blocks[0].instructions[0].op, Op::Add);
    }
}
