//! Common-subexpression elimination.
//!
//! Per-block value numbering keyed by `(op, type, tag, operands)`. A
//! repeated pure computation rewrites into an `Assign` of the earlier
//! result. Side-effectful instructions are barriers that clear the
//! table; the table never crosses block boundaries.

use crate::ir::{IrInstruction, IrModule, Op, ValueId};
use std::collections::HashMap;

type ExprKey = (String, Option<String>, Option<String>, Vec<ValueId>);

pub fn run(mut module: IrModule) -> IrModule {
    for function in &mut module.functions {
        for block in &mut function.blocks {
            let mut available: HashMap<ExprKey, ValueId> = HashMap::new();
            for instruction in &mut block.instructions {
                if instruction.has_side_effects() {
                    available.clear();
                    continue;
                }
                if !instruction.op.is_pure() || instruction.op == Op::Assign {
                    continue;
                }
                let Some(result) = instruction.result else {
                    continue;
                };
                let key: ExprKey = (
                    instruction.op.name().to_string(),
                    instruction.ty.clone(),
                    instruction.tag.clone(),
                    instruction.operands.clone(),
                );
                match available.get(&key) {
                    Some(&prior) => {
                        let ty = instruction.ty.clone().unwrap_or_default();
                        *instruction = IrInstruction::new(Op::Assign)
                            .with_operands(vec![prior])
                            .with_result(result, ty);
                    }
                    None => {
                        available.insert(key, result);
                    }
                }
            }
        }
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::{FunctionBuilder, ModuleBuilder};
    use crate::ir::ValueKind;

    #[test]
    fn duplicate_expression_becomes_assign() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, "float").id();
        let a = builder.value(ValueKind::Temp, "float").id();
        let b = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .block("entry", |blk| {
                blk.binary(Op::Add, p, p, a, "float");
                blk.binary(Op::Add, p, p, b, "float");
                blk.ret(Some(b));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        assert_eq!(instructions[0].op, Op::Add);
        assert_eq!(instructions[1].op, Op::Assign);
        assert_eq!(instructions[1].operands, vec![a]);
        assert_eq!(instructions[1].result, Some(b));
    }

    #[test]
    fn different_tags_are_different_expressions() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, "float4").id();
        let a = builder.value(ValueKind::Temp, "float2").id();
        let b = builder.value(ValueKind::Temp, "float2").id();
        let function = FunctionBuilder::new("main", "float4")
            .parameter(p)
            .block("entry", |blk| {
                blk.swizzle(p, "xy", a, "float2");
                blk.swizzle(p, "zw", b, "float2");
                blk.ret(Some(p));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        assert_eq!(instructions[0].op, Op::Swizzle);
        assert_eq!(instructions[1].op, Op::Swizzle);
    }

    #[test]
    fn side_effects_clear_the_table() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let tex = builder
            .value(ValueKind::Texture2D, "RWTexture2D<float4>")
            .id();
        let p = builder.value(ValueKind::Parameter, "float").id();
        let a = builder.value(ValueKind::Temp, "float").id();
        let b = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .block("entry", |blk| {
                blk.binary(Op::Add, p, p, a, "float");
                blk.store(tex, a);
                blk.binary(Op::Add, p, p, b, "float");
                blk.ret(Some(b));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        assert_eq!(instructions[2].op, Op::Add, "barrier should block reuse");
    }

    #[test]
    fn table_does_not_cross_blocks() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, "float").id();
        let a = builder.value(ValueKind::Temp, "float").id();
        let b = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(p)
            .block("entry", |blk| {
                blk.binary(Op::Mul, p, p, a, "float");
                blk.branch("next");
            })
            .block("next", |blk| {
                blk.binary(Op::Mul, p, p, b, "float");
                blk.ret(Some(b));
            })
            .build();
        let module = run(builder.function(function).build());

        assert_eq!(module.functions[0].blocks[1].instructions[0].op, Op::Mul);
    }
}
