//! Builder Patterns for IR Construction
//!
//! Fluent APIs for constructing modules and functions, particularly
//! useful for tests and embedders that synthesize IR directly.
//!
//! ## Example
//!
//! ```rust
//! use openfxc_ir::ir::builders::{FunctionBuilder, ModuleBuilder};
//! use openfxc_ir::ir::{Op, ValueKind};
//!
//! // Build: float4 main(float4 v1) { return v1; }
//! let mut module = ModuleBuilder::new("ps_2_0");
//! let v1 = module.value(ValueKind::Parameter, "float4").named("v1").id();
//!
//! let main = FunctionBuilder::new("main", "float4")
//!     .parameter(v1)
//!     .block("entry", |b| {
//!         b.ret(Some(v1));
//!     })
//!     .build();
//!
//! let module = module.function(main).build();
//! assert_eq!(module.functions.len(), 1);
//! ```

use super::{
    cond_tag, IrBlock, IrFunction, IrInstruction, IrModule, IrValue, Op, ValueId, ValueKind,
};

// ModuleBuilder

/// Builder for constructing [`IrModule`] instances
#[derive(Debug)]
pub struct ModuleBuilder {
    module: IrModule,
}

impl ModuleBuilder {
    pub fn new(profile: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: IrModule::new(profile),
        }
    }

    /// Allocate a value with a fresh id; refine it through the returned
    /// handle
    pub fn value(&mut self, kind: ValueKind, ty: impl Into<String>) -> ValueHandle<'_> {
        let id = self.module.alloc_value(kind, ty, None);
        ValueHandle {
            module: &mut self.module,
            id,
        }
    }

    /// Shorthand for a constant value carrying its literal text
    pub fn constant(&mut self, ty: impl Into<String>, text: impl Into<String>) -> ValueId {
        self.value(ValueKind::Constant, ty).named(text).id()
    }

    pub fn function(mut self, function: IrFunction) -> ModuleBuilder {
        self.module.functions.push(function);
        self
    }

    pub fn build(self) -> IrModule {
        self.module
    }
}

/// Handle to a freshly allocated value inside a [`ModuleBuilder`]
#[derive(Debug)]
pub struct ValueHandle<'a> {
    module: &'a mut IrModule,
    id: ValueId,
}

impl ValueHandle<'_> {
    pub fn named(self, name: impl Into<String>) -> Self {
        if let Some(value) = self.module.value_mut(self.id) {
            value.name = Some(name.into());
        }
        self
    }

    pub fn semantic(self, semantic: impl Into<String>) -> Self {
        if let Some(value) = self.module.value_mut(self.id) {
            value.semantic = Some(semantic.into());
        }
        self
    }

    pub fn id(self) -> ValueId {
        self.id
    }
}

// FunctionBuilder

/// Builder for constructing [`IrFunction`] instances block by block
#[derive(Debug)]
pub struct FunctionBuilder {
    function: IrFunction,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder {
            function: IrFunction {
                name: name.into(),
                return_type: return_type.into(),
                parameters: Vec::new(),
                blocks: Vec::new(),
            },
        }
    }

    pub fn parameter(mut self, id: ValueId) -> FunctionBuilder {
        self.function.parameters.push(id);
        self
    }

    /// Append a block populated through a [`BlockBuilder`] closure
    pub fn block(mut self, id: impl Into<String>, f: impl FnOnce(&mut BlockBuilder)) -> Self {
        let mut builder = BlockBuilder {
            block: IrBlock::new(id),
        };
        f(&mut builder);
        self.function.blocks.push(builder.block);
        self
    }

    pub fn build(self) -> IrFunction {
        self.function
    }
}

/// Appends instructions to one block
#[derive(Debug)]
pub struct BlockBuilder {
    block: IrBlock,
}

impl BlockBuilder {
    /// Push an already-built instruction
    pub fn push(&mut self, instruction: IrInstruction) -> &mut Self {
        self.block.instructions.push(instruction);
        self
    }

    /// Binary op `result = op(lhs, rhs)` typed `ty`
    pub fn binary(
        &mut self,
        op: Op,
        lhs: ValueId,
        rhs: ValueId,
        result: ValueId,
        ty: impl Into<String>,
    ) -> &mut Self {
        self.push(
            IrInstruction::new(op)
                .with_operands(vec![lhs, rhs])
                .with_result(result, ty),
        )
    }

    /// `result = Assign source`
    pub fn assign(&mut self, source: ValueId, result: ValueId, ty: impl Into<String>) -> &mut Self {
        self.push(
            IrInstruction::new(Op::Assign)
                .with_operands(vec![source])
                .with_result(result, ty),
        )
    }

    /// `result = Swizzle source.mask`
    pub fn swizzle(
        &mut self,
        source: ValueId,
        mask: impl Into<String>,
        result: ValueId,
        ty: impl Into<String>,
    ) -> &mut Self {
        self.push(
            IrInstruction::new(Op::Swizzle)
                .with_operands(vec![source])
                .with_result(result, ty)
                .with_tag(mask),
        )
    }

    /// `Store target, value` (no index)
    pub fn store(&mut self, target: ValueId, value: ValueId) -> &mut Self {
        self.push(IrInstruction::new(Op::Store).with_operands(vec![target, value]))
    }

    /// `Return [operand]`
    pub fn ret(&mut self, operand: Option<ValueId>) -> &mut Self {
        self.push(IrInstruction::new(Op::Return).with_operands(operand.into_iter().collect()))
    }

    /// Unconditional `Branch` to `target`
    pub fn branch(&mut self, target: impl Into<String>) -> &mut Self {
        self.push(IrInstruction::new(Op::Branch).with_tag(target))
    }

    /// `BranchCond condition` with then/else targets
    pub fn branch_cond(
        &mut self,
        condition: ValueId,
        then_target: &str,
        else_target: &str,
    ) -> &mut Self {
        self.push(
            IrInstruction::new(Op::BranchCond)
                .with_operands(vec![condition])
                .with_tag(cond_tag(then_target, else_target)),
        )
    }
}

// Convenience constructors used across tests

/// A bare value with an explicit id, outside the builder's allocator
pub fn value(id: ValueId, kind: ValueKind, ty: impl Into<String>) -> IrValue {
    IrValue {
        id,
        ty: ty.into(),
        kind,
        name: None,
        semantic: None,
    }
}
