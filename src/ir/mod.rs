//! # IR Data Model
//!
//! Backend-agnostic, SSA-ish, typed intermediate representation shared
//! between the lowering and optimization pipelines.
//!
//! ```text
//! Semantic Model -> [Lowering] -> IrModule -> [Optimizer] -> IrModule
//!                                    |                          |
//!                                    +---- [Invariant Validator]+
//! ```
//!
//! The wire format is JSON with camelCase fields; `formatVersion` is
//! fixed at 1. Operations form a closed grammar represented by [`Op`];
//! unknown names survive round-trips through [`Op::Other`] so the
//! validator can still scan them for back-end leakage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub mod builders;
pub mod constant;
pub mod types;

/// Identifier of an SSA value; positive and unique within a module
pub type ValueId = u64;

// ============================================================================
// Operations
// ============================================================================

/// The closed instruction grammar.
///
/// Core memory/flow ops plus the abstract intrinsic ops the lowering
/// pipeline maps HLSL intrinsics onto. `Other` preserves out-of-grammar
/// op names on the wire; such instructions are never produced by
/// lowering and are surfaced by the invariant validator when their name
/// carries back-end vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Op {
    Load,
    Store,
    Sample,
    Index,
    Swizzle,
    Cast,
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicalAnd,
    LogicalOr,
    Negate,
    Not,
    BitNot,
    /// Unary identity (`+x`)
    Unary,
    Call,
    Return,
    Branch,
    BranchCond,
    Nop,
    // Abstract intrinsic operations
    Dot,
    Normalize,
    Saturate,
    Sin,
    Cos,
    Abs,
    Min,
    Max,
    Clamp,
    Lerp,
    Pow,
    Exp,
    Log,
    Step,
    SmoothStep,
    Reflect,
    Refract,
    Atan2,
    Fma,
    Ddx,
    Ddy,
    Length,
    Rsqrt,
    Rcp,
    /// Out-of-grammar op name preserved for diagnostics
    Other(String),
}

impl Op {
    /// Wire name of the operation
    pub fn name(&self) -> &str {
        match self {
            Op::Load => "Load",
            Op::Store => "Store",
            Op::Sample => "Sample",
            Op::Index => "Index",
            Op::Swizzle => "Swizzle",
            Op::Cast => "Cast",
            Op::Assign => "Assign",
            Op::Add => "Add",
            Op::Sub => "Sub",
            Op::Mul => "Mul",
            Op::Div => "Div",
            Op::Mod => "Mod",
            Op::Eq => "Eq",
            Op::Ne => "Ne",
            Op::Lt => "Lt",
            Op::Le => "Le",
            Op::Gt => "Gt",
            Op::Ge => "Ge",
            Op::LogicalAnd => "LogicalAnd",
            Op::LogicalOr => "LogicalOr",
            Op::Negate => "Negate",
            Op::Not => "Not",
            Op::BitNot => "BitNot",
            Op::Unary => "Unary",
            Op::Call => "Call",
            Op::Return => "Return",
            Op::Branch => "Branch",
            Op::BranchCond => "BranchCond",
            Op::Nop => "Nop",
            Op::Dot => "Dot",
            Op::Normalize => "Normalize",
            Op::Saturate => "Saturate",
            Op::Sin => "Sin",
            Op::Cos => "Cos",
            Op::Abs => "Abs",
            Op::Min => "Min",
            Op::Max => "Max",
            Op::Clamp => "Clamp",
            Op::Lerp => "Lerp",
            Op::Pow => "Pow",
            Op::Exp => "Exp",
            Op::Log => "Log",
            Op::Step => "Step",
            Op::SmoothStep => "SmoothStep",
            Op::Reflect => "Reflect",
            Op::Refract => "Refract",
            Op::Atan2 => "Atan2",
            Op::Fma => "Fma",
            Op::Ddx => "Ddx",
            Op::Ddy => "Ddy",
            Op::Length => "Length",
            Op::Rsqrt => "Rsqrt",
            Op::Rcp => "Rcp",
            Op::Other(name) => name,
        }
    }

    /// Parse a wire name; unrecognized names become [`Op::Other`]
    pub fn parse(name: &str) -> Op {
        match name {
            "Load" => Op::Load,
            "Store" => Op::Store,
            "Sample" => Op::Sample,
            "Index" => Op::Index,
            "Swizzle" => Op::Swizzle,
            "Cast" => Op::Cast,
            "Assign" => Op::Assign,
            "Add" => Op::Add,
            "Sub" => Op::Sub,
            "Mul" => Op::Mul,
            "Div" => Op::Div,
            "Mod" => Op::Mod,
            "Eq" => Op::Eq,
            "Ne" => Op::Ne,
            "Lt" => Op::Lt,
            "Le" => Op::Le,
            "Gt" => Op::Gt,
            "Ge" => Op::Ge,
            "LogicalAnd" => Op::LogicalAnd,
            "LogicalOr" => Op::LogicalOr,
            "Negate" => Op::Negate,
            "Not" => Op::Not,
            "BitNot" => Op::BitNot,
            "Unary" => Op::Unary,
            "Call" => Op::Call,
            "Return" => Op::Return,
            "Branch" => Op::Branch,
            "BranchCond" => Op::BranchCond,
            "Nop" => Op::Nop,
            "Dot" => Op::Dot,
            "Normalize" => Op::Normalize,
            "Saturate" => Op::Saturate,
            "Sin" => Op::Sin,
            "Cos" => Op::Cos,
            "Abs" => Op::Abs,
            "Min" => Op::Min,
            "Max" => Op::Max,
            "Clamp" => Op::Clamp,
            "Lerp" => Op::Lerp,
            "Pow" => Op::Pow,
            "Exp" => Op::Exp,
            "Log" => Op::Log,
            "Step" => Op::Step,
            "SmoothStep" => Op::SmoothStep,
            "Reflect" => Op::Reflect,
            "Refract" => Op::Refract,
            "Atan2" => Op::Atan2,
            "Fma" => Op::Fma,
            "Ddx" => Op::Ddx,
            "Ddy" => Op::Ddy,
            "Length" => Op::Length,
            "Rsqrt" => Op::Rsqrt,
            "Rcp" => Op::Rcp,
            other => Op::Other(other.to_string()),
        }
    }

    /// Terminator ops end a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Return | Op::Branch | Op::BranchCond)
    }

    /// The closed purity set used by DCE and CSE
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            Op::Add
                | Op::Sub
                | Op::Mul
                | Op::Div
                | Op::Mod
                | Op::Eq
                | Op::Ne
                | Op::Lt
                | Op::Le
                | Op::Gt
                | Op::Ge
                | Op::LogicalAnd
                | Op::LogicalOr
                | Op::Swizzle
                | Op::Cast
                | Op::Assign
                | Op::Index
        )
    }

    /// Binary arithmetic/comparison/logical ops with two-operand type
    /// rules
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Op::Add
                | Op::Sub
                | Op::Mul
                | Op::Div
                | Op::Mod
                | Op::Eq
                | Op::Ne
                | Op::Lt
                | Op::Le
                | Op::Gt
                | Op::Ge
                | Op::LogicalAnd
                | Op::LogicalOr
        )
    }

    /// Comparison ops always produce `bool`
    pub fn is_comparison(&self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }
}

impl From<String> for Op {
    fn from(name: String) -> Op {
        Op::parse(&name)
    }
}

impl From<Op> for String {
    fn from(op: Op) -> String {
        op.name().to_string()
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Values and resources
// ============================================================================

/// Classification of an SSA value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueKind {
    Parameter,
    Constant,
    Temp,
    Undef,
    Sampler,
    Texture,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    CBuffer,
    Buffer,
    GlobalVariable,
    Resource,
    StructMember,
    CBufferMember,
    /// Kind name outside the closed set, preserved for diagnostics
    Other(String),
}

impl ValueKind {
    /// Wire name of the kind
    pub fn name(&self) -> &str {
        match self {
            ValueKind::Parameter => "Parameter",
            ValueKind::Constant => "Constant",
            ValueKind::Temp => "Temp",
            ValueKind::Undef => "Undef",
            ValueKind::Sampler => "Sampler",
            ValueKind::Texture => "Texture",
            ValueKind::Texture1D => "Texture1D",
            ValueKind::Texture2D => "Texture2D",
            ValueKind::Texture3D => "Texture3D",
            ValueKind::TextureCube => "TextureCube",
            ValueKind::CBuffer => "CBuffer",
            ValueKind::Buffer => "Buffer",
            ValueKind::GlobalVariable => "GlobalVariable",
            ValueKind::Resource => "Resource",
            ValueKind::StructMember => "StructMember",
            ValueKind::CBufferMember => "CBufferMember",
            ValueKind::Other(name) => name,
        }
    }

    /// Parse a wire name; unrecognized names become [`ValueKind::Other`]
    pub fn parse(name: &str) -> ValueKind {
        match name {
            "Parameter" => ValueKind::Parameter,
            "Constant" => ValueKind::Constant,
            "Temp" => ValueKind::Temp,
            "Undef" => ValueKind::Undef,
            "Sampler" => ValueKind::Sampler,
            "Texture" => ValueKind::Texture,
            "Texture1D" => ValueKind::Texture1D,
            "Texture2D" => ValueKind::Texture2D,
            "Texture3D" => ValueKind::Texture3D,
            "TextureCube" => ValueKind::TextureCube,
            "CBuffer" => ValueKind::CBuffer,
            "Buffer" => ValueKind::Buffer,
            "GlobalVariable" => ValueKind::GlobalVariable,
            "Resource" => ValueKind::Resource,
            "StructMember" => ValueKind::StructMember,
            "CBufferMember" => ValueKind::CBufferMember,
            other => ValueKind::Other(other.to_string()),
        }
    }

    /// Texture-family kinds
    pub fn is_texture(&self) -> bool {
        matches!(
            self,
            ValueKind::Texture
                | ValueKind::Texture1D
                | ValueKind::Texture2D
                | ValueKind::Texture3D
                | ValueKind::TextureCube
        ) || self.name().starts_with("Texture")
    }
}

impl From<String> for ValueKind {
    fn from(name: String) -> ValueKind {
        ValueKind::parse(&name)
    }
}

impl From<ValueKind> for String {
    fn from(kind: ValueKind) -> String {
        kind.name().to_string()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An SSA-identifiable datum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrValue {
    /// Positive, unique within the module
    pub id: ValueId,
    /// Type descriptor from the closed type grammar
    #[serde(rename = "type")]
    pub ty: String,
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Formatted semantic binding, e.g. `POSITION0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<String>,
}

/// Mirror of a global resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrResource {
    pub name: String,
    pub kind: ValueKind,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub writable: bool,
}

// ============================================================================
// Instructions and blocks
// ============================================================================

/// A single typed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrInstruction {
    pub op: Op,
    #[serde(default)]
    pub operands: Vec<ValueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ValueId>,
    /// Required when `result` is present; must equal the result value's type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default)]
    pub terminator: bool,
    /// Swizzle mask, branch target(s), callee name, or load/store metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl IrInstruction {
    /// Instruction with no operands, result, or tag
    pub fn new(op: Op) -> IrInstruction {
        let terminator = op.is_terminator();
        IrInstruction {
            op,
            operands: Vec::new(),
            result: None,
            ty: None,
            terminator,
            tag: None,
        }
    }

    pub fn with_operands(mut self, operands: Vec<ValueId>) -> IrInstruction {
        self.operands = operands;
        self
    }

    pub fn with_result(mut self, result: ValueId, ty: impl Into<String>) -> IrInstruction {
        self.result = Some(result);
        self.ty = Some(ty.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> IrInstruction {
        self.tag = Some(tag.into());
        self
    }

    /// Side effects bar DCE deletion and act as CSE barriers: any op
    /// whose name contains `Sample`, every `Store`, and any tag
    /// containing `discard`.
    pub fn has_side_effects(&self) -> bool {
        if self.op == Op::Store || self.op.name().contains("Sample") {
            return true;
        }
        self.tag.as_deref().is_some_and(|t| t.contains("discard"))
    }

    /// Target of an unconditional `Branch` (the whole tag)
    pub fn branch_target(&self) -> Option<&str> {
        if self.op == Op::Branch {
            self.tag.as_deref().filter(|t| !t.is_empty())
        } else {
            None
        }
    }

    /// `(then, else)` targets of a `BranchCond` tag `then:<b>;else:<b>`
    pub fn cond_targets(&self) -> Option<(&str, &str)> {
        if self.op != Op::BranchCond {
            return None;
        }
        let tag = self.tag.as_deref()?;
        let mut then_target = None;
        let mut else_target = None;
        for part in tag.split(';') {
            if let Some(t) = part.strip_prefix("then:") {
                then_target = Some(t);
            } else if let Some(t) = part.strip_prefix("else:") {
                else_target = Some(t);
            }
        }
        Some((then_target?, else_target?))
    }

    /// All terminator edge targets, in tag order
    pub fn successor_targets(&self) -> Vec<&str> {
        match self.op {
            Op::Branch => self.branch_target().into_iter().collect(),
            Op::BranchCond => self
                .cond_targets()
                .map(|(t, e)| vec![t, e])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Swizzle lane indices from the tag (`xy` -> `[0, 1]`); `None` when
    /// any character is outside the lane alphabet
    pub fn swizzle_lanes(&self) -> Option<Vec<u8>> {
        let tag = self.tag.as_deref()?;
        tag.chars().map(swizzle_lane).collect()
    }
}

/// Format a `BranchCond` tag from its two targets
pub fn cond_tag(then_target: &str, else_target: &str) -> String {
    format!("then:{then_target};else:{else_target}")
}

/// Lane index of a swizzle character: x/r/u -> 0, y/g/v -> 1, z/b -> 2,
/// w/a -> 3
pub fn swizzle_lane(c: char) -> Option<u8> {
    match c {
        'x' | 'r' | 'u' => Some(0),
        'y' | 'g' | 'v' => Some(1),
        'z' | 'b' => Some(2),
        'w' | 'a' => Some(3),
        _ => None,
    }
}

/// A maximal linear sequence of instructions ending in one terminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrBlock {
    /// Unique within the function
    pub id: String,
    #[serde(default)]
    pub instructions: Vec<IrInstruction>,
}

impl IrBlock {
    pub fn new(id: impl Into<String>) -> IrBlock {
        IrBlock {
            id: id.into(),
            instructions: Vec::new(),
        }
    }

    /// The trailing terminator, if the block is well formed
    pub fn terminator(&self) -> Option<&IrInstruction> {
        self.instructions.last().filter(|i| i.terminator)
    }
}

/// A lowered function; the first block is the entry block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrFunction {
    pub name: String,
    pub return_type: String,
    /// Value ids of the parameters, in declaration order
    #[serde(default)]
    pub parameters: Vec<ValueId>,
    #[serde(default)]
    pub blocks: Vec<IrBlock>,
}

impl IrFunction {
    pub fn block(&self, id: &str) -> Option<&IrBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_index(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn entry_block(&self) -> Option<&IrBlock> {
        self.blocks.first()
    }
}

// ============================================================================
// Techniques
// ============================================================================

/// Pipeline stage tag for entry points and shader bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
    Compute,
    #[default]
    Unknown,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Pixel => "Pixel",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::Hull => "Hull",
            ShaderStage::Domain => "Domain",
            ShaderStage::Compute => "Compute",
            ShaderStage::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// The function a module compiles, with its stage tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub name: String,
    #[serde(default)]
    pub stage: ShaderStage,
}

/// Binding of one pipeline stage to an entry symbol inside a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaderBinding {
    pub stage: ShaderStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub entry: String,
}

/// Fixed-function state setting inside a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateAssignment {
    pub name: String,
    pub value: String,
}

/// One pass of a technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrPass {
    pub name: String,
    #[serde(default)]
    pub shader_bindings: Vec<ShaderBinding>,
    #[serde(default)]
    pub state_assignments: Vec<StateAssignment>,
}

/// Effect-file technique metadata, forwarded through lowering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrTechnique {
    pub name: String,
    #[serde(default)]
    pub passes: Vec<IrPass>,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lower,
    Optimize,
    Invariant,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lower => "lower",
            Stage::Optimize => "optimize",
            Stage::Invariant => "invariant",
        };
        f.write_str(name)
    }
}

/// A message produced by lowering, optimization, or validation.
///
/// Errors are data, not control flow: pipelines append diagnostics and
/// continue with the best-effort module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub stage: Stage,
}

impl Diagnostic {
    pub fn error(stage: Stage, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            stage,
        }
    }

    pub fn warning(stage: Stage, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            stage,
        }
    }

    pub fn info(stage: Stage, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            severity: Severity::Info,
            stage,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{}] {}", self.severity, self.stage, self.message)
    }
}

// ============================================================================
// Module
// ============================================================================

/// Root of the IR: functions, the module-wide value table, resources,
/// techniques, and accumulated diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrModule {
    /// Fixed at [`IrModule::FORMAT_VERSION`]
    pub format_version: u32,
    /// Free-form profile tag such as `ps_2_0`
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<EntryPoint>,
    #[serde(default)]
    pub functions: Vec<IrFunction>,
    #[serde(default)]
    pub values: Vec<IrValue>,
    #[serde(default)]
    pub resources: Vec<IrResource>,
    #[serde(default)]
    pub techniques: Vec<IrTechnique>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl IrModule {
    /// The only wire format version this crate reads or writes
    pub const FORMAT_VERSION: u32 = 1;

    pub fn new(profile: impl Into<String>) -> IrModule {
        IrModule {
            format_version: IrModule::FORMAT_VERSION,
            profile: profile.into(),
            entry_point: None,
            functions: Vec::new(),
            values: Vec::new(),
            resources: Vec::new(),
            techniques: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Look up a value by id
    pub fn value(&self, id: ValueId) -> Option<&IrValue> {
        self.values.iter().find(|v| v.id == id)
    }

    pub fn value_mut(&mut self, id: ValueId) -> Option<&mut IrValue> {
        self.values.iter_mut().find(|v| v.id == id)
    }

    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Lowest unused positive value id
    pub fn next_value_id(&self) -> ValueId {
        let used: HashSet<ValueId> = self.values.iter().map(|v| v.id).collect();
        let mut id = 1;
        while used.contains(&id) {
            id += 1;
        }
        id
    }

    /// Allocate a fresh value and return its id
    pub fn alloc_value(
        &mut self,
        kind: ValueKind,
        ty: impl Into<String>,
        name: Option<String>,
    ) -> ValueId {
        let id = self.next_value_id();
        self.values.push(IrValue {
            id,
            ty: ty.into(),
            kind,
            name,
            semantic: None,
        });
        id
    }

    /// Whether any accumulated diagnostic has `Error` severity
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_round_trips_through_wire_names() {
        for op in [Op::Load, Op::BranchCond, Op::SmoothStep, Op::Rcp] {
            assert_eq!(Op::parse(op.name()), op);
        }
        let foreign = Op::parse("FancyOp");
        assert_eq!(foreign, Op::Other("FancyOp".to_string()));
        assert_eq!(foreign.name(), "FancyOp");
    }

    #[test]
    fn purity_matches_the_closed_set() {
        for op in [Op::Add, Op::Swizzle, Op::Cast, Op::Assign, Op::Index, Op::Ge] {
            assert!(op.is_pure(), "{op} should be pure");
        }
        for op in [Op::Load, Op::Store, Op::Sample, Op::Call, Op::Dot, Op::Sin] {
            assert!(!op.is_pure(), "{op} should not be pure");
        }
    }

    #[test]
    fn sample_family_and_discard_tags_are_side_effects() {
        let sample = IrInstruction::new(Op::Sample);
        assert!(sample.has_side_effects());

        let foreign = IrInstruction::new(Op::parse("TextureSampleBias"));
        assert!(foreign.has_side_effects());

        let discard = IrInstruction::new(Op::Call).with_tag("discard");
        assert!(discard.has_side_effects());

        let add = IrInstruction::new(Op::Add);
        assert!(!add.has_side_effects());
    }

    #[test]
    fn cond_targets_parse_both_orders() {
        let i = IrInstruction::new(Op::BranchCond).with_tag(cond_tag("then1", "merge2"));
        assert_eq!(i.cond_targets(), Some(("then1", "merge2")));
        assert_eq!(i.successor_targets(), vec!["then1", "merge2"]);

        let flipped = IrInstruction::new(Op::BranchCond).with_tag("else:b;then:a");
        assert_eq!(flipped.cond_targets(), Some(("a", "b")));
    }

    #[test]
    fn swizzle_lane_alphabet() {
        let i = IrInstruction::new(Op::Swizzle).with_tag("rgba");
        assert_eq!(i.swizzle_lanes(), Some(vec![0, 1, 2, 3]));
        let bad = IrInstruction::new(Op::Swizzle).with_tag("xq");
        assert_eq!(bad.swizzle_lanes(), None);
    }

    #[test]
    fn next_value_id_is_lowest_unused() {
        let mut module = IrModule::new("ps_2_0");
        assert_eq!(module.next_value_id(), 1);
        module.alloc_value(ValueKind::Temp, "float", None);
        module.values.push(IrValue {
            id: 3,
            ty: "float".to_string(),
            kind: ValueKind::Temp,
            name: None,
            semantic: None,
        });
        assert_eq!(module.next_value_id(), 2);
    }
}
