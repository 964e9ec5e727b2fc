//! Component-level dead-code elimination.
//!
//! Computes per-value liveness masks over the four lanes {x, y, z, w}
//! by reverse traversal: a `Swizzle` requires only the source lanes its
//! live result positions select; every other op requires its operands in
//! full. Swizzles whose results are entirely dead are dropped; swizzles
//! with a strictly live subset narrow their result type to the reduced
//! component count and trim the mask to the live lane characters.
//!
//! This is the one place a value's type may change after creation.

use crate::ir::{types, IrModule, Op, ValueId};
use std::collections::HashMap;

pub fn run(mut module: IrModule) -> IrModule {
    for fi in 0..module.functions.len() {
        let masks = compute_masks(&module, fi);
        let narrowed = rewrite_swizzles(&mut module, fi, &masks);
        for (id, ty) in narrowed {
            if let Some(value) = module.value_mut(id) {
                value.ty = ty;
            }
        }
    }
    module
}

fn full_mask_of(module: &IrModule, id: ValueId) -> u8 {
    let shape = module
        .value(id)
        .and_then(|v| types::parse_shape(&v.ty));
    match shape {
        Some(shape) => lane_mask(shape.component_count()),
        // Unknown shapes (resources, structs) are conservatively full
        None => 0xF,
    }
}

fn lane_mask(count: usize) -> u8 {
    ((1u16 << count.min(4)) - 1) as u8
}

/// Reverse-order mask propagation, iterated to a fixed point so uses in
/// earlier blocks (loop conditions) reach definitions in later ones.
fn compute_masks(module: &IrModule, fi: usize) -> HashMap<ValueId, u8> {
    let function = &module.functions[fi];
    let mut live: HashMap<ValueId, u8> = HashMap::new();
    loop {
        let mut changed = false;
        for block in function.blocks.iter().rev() {
            for instruction in block.instructions.iter().rev() {
                let swizzle = (instruction.op == Op::Swizzle)
                    .then(|| {
                        Some((
                            instruction.result?,
                            instruction.swizzle_lanes()?,
                            *instruction.operands.first()?,
                        ))
                    })
                    .flatten();
                if let Some((result, lanes, source)) = swizzle {
                    let result_mask = live.get(&result).copied().unwrap_or(0);
                    let mut requirement = 0u8;
                    for (position, &lane) in lanes.iter().enumerate().take(4) {
                        if result_mask & (1 << position) != 0 {
                            requirement |= 1 << lane;
                        }
                    }
                    changed |= union_mask(&mut live, source, requirement);
                } else {
                    for &operand in &instruction.operands {
                        let mask = full_mask_of(module, operand);
                        changed |= union_mask(&mut live, operand, mask);
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    live
}

fn union_mask(live: &mut HashMap<ValueId, u8>, id: ValueId, mask: u8) -> bool {
    let entry = live.entry(id).or_insert(0);
    let merged = *entry | mask;
    let changed = merged != *entry;
    *entry = merged;
    changed
}

/// Drop dead swizzles, narrow partially live ones. Returns the value
/// type updates to apply to the module table.
fn rewrite_swizzles(
    module: &mut IrModule,
    fi: usize,
    masks: &HashMap<ValueId, u8>,
) -> Vec<(ValueId, String)> {
    let mut narrowed = Vec::new();
    for block in &mut module.functions[fi].blocks {
        block.instructions.retain_mut(|instruction| {
            if instruction.op != Op::Swizzle || instruction.terminator {
                return true;
            }
            let (Some(result), Some(tag), Some(ty)) = (
                instruction.result,
                instruction.tag.clone(),
                instruction.ty.as_deref(),
            ) else {
                return true;
            };
            if instruction.swizzle_lanes().is_none() {
                return true;
            }
            let Some(shape) = types::parse_shape(ty) else {
                return true;
            };
            let count = shape.component_count().min(4);
            if count != tag.chars().count() {
                // Inconsistent instruction; leave it for the validator
                return true;
            }

            let full = lane_mask(count);
            let live = masks.get(&result).copied().unwrap_or(0) & full;
            if live == 0 {
                // Entirely dead and pure: drop it
                return !(instruction.op.is_pure() && !instruction.has_side_effects());
            }
            if live == full {
                return true;
            }

            let new_tag: String = tag
                .chars()
                .enumerate()
                .filter(|(position, _)| live & (1 << position) != 0)
                .map(|(_, c)| c)
                .collect();
            let new_ty = shape.with_component_count(new_tag.chars().count()).to_string();
            instruction.tag = Some(new_tag);
            instruction.ty = Some(new_ty.clone());
            narrowed.push((result, new_ty));
            true
        });
    }
    narrowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::{FunctionBuilder, ModuleBuilder};
    use crate::ir::ValueKind;

    #[test]
    fn narrows_partially_live_swizzle() {
        // Scenario: v2 = v1.xy, v3 = v2.x, return v3. Only v2's first
        // lane is live, so v2 narrows to float and its mask to `x`.
        let mut builder = ModuleBuilder::new("ps_2_0");
        let v1 = builder.value(ValueKind::Parameter, "float4").id();
        let v2 = builder.value(ValueKind::Temp, "float2").id();
        let v3 = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(v1)
            .block("entry", |blk| {
                blk.swizzle(v1, "xy", v2, "float2");
                blk.swizzle(v2, "x", v3, "float");
                blk.ret(Some(v3));
            })
            .build();
        let module = run(builder.function(function).build());

        let first = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(first.tag.as_deref(), Some("x"));
        assert_eq!(first.ty.as_deref(), Some("float"));
        assert_eq!(module.value(v2).unwrap().ty, "float");
        // v3 is fully live and untouched
        assert_eq!(module.value(v3).unwrap().ty, "float");
    }

    #[test]
    fn drops_entirely_dead_swizzle() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let v1 = builder.value(ValueKind::Parameter, "float4").id();
        let dead = builder.value(ValueKind::Temp, "float2").id();
        let function = FunctionBuilder::new("main", "float4")
            .parameter(v1)
            .block("entry", |blk| {
                blk.swizzle(v1, "xy", dead, "float2");
                blk.ret(Some(v1));
            })
            .build();
        let module = run(builder.function(function).build());

        let instructions = &module.functions[0].blocks[0].instructions;
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].op, Op::Return);
    }

    #[test]
    fn fully_used_swizzle_is_untouched() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let v1 = builder.value(ValueKind::Parameter, "float4").id();
        let v2 = builder.value(ValueKind::Temp, "float2").id();
        let function = FunctionBuilder::new("main", "float2")
            .parameter(v1)
            .block("entry", |blk| {
                blk.swizzle(v1, "xy", v2, "float2");
                blk.ret(Some(v2));
            })
            .build();
        let module = run(builder.function(function).build());

        let first = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(first.tag.as_deref(), Some("xy"));
        assert_eq!(first.ty.as_deref(), Some("float2"));
        assert_eq!(module.value(v2).unwrap().ty, "float2");
    }

    #[test]
    fn non_swizzle_use_keeps_all_lanes() {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let v1 = builder.value(ValueKind::Parameter, "float4").id();
        let v2 = builder.value(ValueKind::Temp, "float2").id();
        let v3 = builder.value(ValueKind::Temp, "float2").id();
        let v4 = builder.value(ValueKind::Temp, "float").id();
        let function = FunctionBuilder::new("main", "float")
            .parameter(v1)
            .block("entry", |blk| {
                blk.swizzle(v1, "xy", v2, "float2");
                // Add consumes v2 whole, so no narrowing despite v4
                blk.binary(Op::Add, v2, v2, v3, "float2");
                blk.swizzle(v3, "x", v4, "float");
                blk.ret(Some(v4));
            })
            .build();
        let module = run(builder.function(function).build());

        let first = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(first.tag.as_deref(), Some("xy"));
        assert_eq!(module.value(v2).unwrap().ty, "float2");
    }
}
