//! # Invariant Validator
//!
//! Pure structural and type-level validation of IR modules, shared by
//! the lowering and optimization pipelines. Every finding is reported;
//! validation never fails fast and never mutates the module.
//!
//! Checks cover value identity (positive, unique ids; non-empty types),
//! SSA-ish single definition, operand resolution, block termination and
//! reachability, branch target arity, the per-op type rules, and the
//! back-end leakage policy: no dxbc/dxil/spirv/d3d/glsl/metal token may
//! appear as a whole word in any identified field.

use crate::ir::{
    types, Diagnostic, IrFunction, IrInstruction, IrModule, Op, Stage, ValueId,
};
use crate::optimizer::cfg::Cfg;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Validate a module, returning one diagnostic per violation.
pub fn validate(module: &IrModule) -> Vec<Diagnostic> {
    let mut validator = Validator::new(module);
    validator.check_module();
    validator.diagnostics
}

fn leak_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(dxbc|dxil|spirv|d3d|glsl|metal)\b").expect("leak pattern compiles")
    })
}

struct Validator<'a> {
    module: &'a IrModule,
    values: HashMap<ValueId, &'a crate::ir::IrValue>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    fn new(module: &'a IrModule) -> Validator<'a> {
        Validator {
            module,
            values: module.values.iter().map(|v| (v.id, v)).collect(),
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(Stage::Invariant, message));
    }

    fn check_module(&mut self) {
        if self.module.format_version != IrModule::FORMAT_VERSION {
            self.error(format!(
                "module formatVersion must be {}, found {}",
                IrModule::FORMAT_VERSION,
                self.module.format_version
            ));
        }
        self.check_values();
        for function in &self.module.functions {
            self.check_function(function);
        }
        self.check_leaks();
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn check_values(&mut self) {
        let mut seen: HashSet<ValueId> = HashSet::new();
        for value in &self.module.values {
            if value.id == 0 {
                self.error("value id must be positive");
            }
            if !seen.insert(value.id) {
                self.error(format!("value id {} is not unique", value.id));
            }
            if value.ty.is_empty() {
                self.error(format!("value {} declares an empty type", value.id));
            }
        }
    }

    // ------------------------------------------------------------------
    // Functions and blocks
    // ------------------------------------------------------------------

    fn check_function(&mut self, function: &IrFunction) {
        let name = &function.name;
        if function.blocks.is_empty() {
            self.error(format!("function '{name}' has no blocks"));
            return;
        }
        if function.blocks[0].id.is_empty() {
            self.error(format!("function '{name}' has an unnamed entry block"));
        }

        let mut block_ids: HashSet<&str> = HashSet::new();
        for block in &function.blocks {
            if !block_ids.insert(&block.id) {
                self.error(format!(
                    "function '{name}' repeats block id '{}'",
                    block.id
                ));
            }
        }

        self.check_termination(function);
        self.check_definitions(function);
        for block in &function.blocks {
            for instruction in &block.instructions {
                self.check_instruction(function, &block.id, instruction);
            }
        }
        self.check_reachability(function);
    }

    fn check_termination(&mut self, function: &IrFunction) {
        for block in &function.blocks {
            let name = &function.name;
            let id = &block.id;
            if block.instructions.is_empty() {
                self.error(format!("block '{id}' in '{name}' is empty"));
                continue;
            }
            let last = block.instructions.len() - 1;
            for (i, instruction) in block.instructions.iter().enumerate() {
                if instruction.terminator && i != last {
                    self.error(format!(
                        "block '{id}' in '{name}' has instructions after its terminator"
                    ));
                }
            }
            if !block.instructions[last].terminator {
                self.error(format!(
                    "block '{id}' in '{name}' does not end with a terminator"
                ));
            }
        }
    }

    /// SSA-ish: a result id is defined by at most one instruction across
    /// the whole function.
    fn check_definitions(&mut self, function: &IrFunction) {
        let mut definitions: HashMap<ValueId, usize> = HashMap::new();
        for block in &function.blocks {
            for instruction in &block.instructions {
                if let Some(result) = instruction.result {
                    *definitions.entry(result).or_insert(0) += 1;
                }
            }
        }
        for (id, count) in definitions {
            if count > 1 {
                self.error(format!(
                    "value {id} is defined by {count} instructions in '{}'",
                    function.name
                ));
            }
        }
    }

    fn check_reachability(&mut self, function: &IrFunction) {
        let cfg = Cfg::build(function);
        for (i, reachable) in cfg.reachable().iter().enumerate() {
            if !reachable {
                self.error(format!(
                    "block '{}' in '{}' is unreachable from the entry block",
                    function.blocks[i].id, function.name
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Instructions
    // ------------------------------------------------------------------

    fn check_instruction(
        &mut self,
        function: &IrFunction,
        block_id: &str,
        instruction: &IrInstruction,
    ) {
        let op = instruction.op.name().to_string();
        for &operand in &instruction.operands {
            if !self.values.contains_key(&operand) {
                self.error(format!(
                    "{op} in block '{block_id}' references unknown value {operand}"
                ));
            }
        }
        if let Some(result) = instruction.result {
            match self.values.get(&result).copied() {
                None => self.error(format!(
                    "{op} in block '{block_id}' defines unknown value {result}"
                )),
                Some(value) => match instruction.ty.as_deref() {
                    None => self.error(format!(
                        "{op} in block '{block_id}' has a result but no type"
                    )),
                    Some(ty) if ty != value.ty => self.error(format!(
                        "{op} result type '{ty}' disagrees with value {result}'s type '{}'",
                        value.ty
                    )),
                    Some(_) => {}
                },
            }
        }

        self.check_branch_targets(function, block_id, instruction);
        self.check_type_rules(function, block_id, instruction);
    }

    fn check_branch_targets(
        &mut self,
        function: &IrFunction,
        block_id: &str,
        instruction: &IrInstruction,
    ) {
        let targets: Vec<&str> = match instruction.op {
            Op::Branch => match instruction.branch_target() {
                Some(target) => vec![target],
                None => {
                    self.error(format!("Branch in block '{block_id}' has no target tag"));
                    return;
                }
            },
            Op::BranchCond => match instruction.cond_targets() {
                Some((t, e)) => vec![t, e],
                None => {
                    self.error(format!(
                        "BranchCond in block '{block_id}' needs a 'then:<id>;else:<id>' tag"
                    ));
                    return;
                }
            },
            _ => return,
        };
        for target in targets {
            if function.block(target).is_none() {
                self.error(format!(
                    "{} in block '{block_id}' targets unknown block '{target}'",
                    instruction.op
                ));
            }
        }
        if instruction.op == Op::BranchCond {
            match instruction.operands.first() {
                None => self.error(format!(
                    "BranchCond in block '{block_id}' has no condition operand"
                )),
                Some(&cond) => {
                    if let Some(value) = self.values.get(&cond).copied() {
                        if value.ty != "bool" && value.ty != "unknown" {
                            self.error(format!(
                                "BranchCond condition {cond} has type '{}', expected bool",
                                value.ty
                            ));
                        }
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Type rules
    // ------------------------------------------------------------------

    fn operand_shape(&self, id: ValueId) -> Option<types::TypeShape> {
        types::parse_shape(&self.values.get(&id)?.ty)
    }

    fn check_type_rules(
        &mut self,
        function: &IrFunction,
        block_id: &str,
        instruction: &IrInstruction,
    ) {
        match instruction.op {
            Op::Assign => self.check_assign(block_id, instruction),
            Op::Swizzle => self.check_swizzle(block_id, instruction),
            Op::Store => self.check_store(block_id, instruction),
            Op::Return => self.check_return(function, block_id, instruction),
            ref op if op.is_binary() => self.check_binary(block_id, instruction),
            _ => {}
        }
    }

    fn check_assign(&mut self, block_id: &str, instruction: &IrInstruction) {
        let (Some(&operand), Some(ty)) =
            (instruction.operands.first(), instruction.ty.as_deref())
        else {
            return;
        };
        let Some(value) = self.values.get(&operand).copied() else {
            return;
        };
        let operand_ty = value.ty.clone();
        if operand_ty != "unknown" && ty != "unknown" && operand_ty != ty {
            self.error(format!(
                "Assign in block '{block_id}' copies '{operand_ty}' into '{ty}'"
            ));
        }
    }

    fn check_binary(&mut self, block_id: &str, instruction: &IrInstruction) {
        let [lhs, rhs] = instruction.operands.as_slice() else {
            self.error(format!(
                "{} in block '{block_id}' takes exactly two operands",
                instruction.op
            ));
            return;
        };
        let (Some(lhs), Some(rhs)) = (self.operand_shape(*lhs), self.operand_shape(*rhs)) else {
            return;
        };
        let op = &instruction.op;

        if matches!(op, Op::LogicalAnd | Op::LogicalOr) {
            if lhs.scalar() != types::ScalarKind::Bool || rhs.scalar() != types::ScalarKind::Bool {
                self.error(format!(
                    "{op} in block '{block_id}' requires bool operands"
                ));
            }
            return;
        }

        if lhs.scalar() != rhs.scalar() || !lhs.scalar().is_numeric() {
            self.error(format!(
                "{op} in block '{block_id}' requires matching numeric scalars, found '{}' and '{}'",
                lhs.scalar(),
                rhs.scalar()
            ));
            return;
        }
        if op.is_comparison() {
            return;
        }
        if let Some(result) = instruction.ty.as_deref().and_then(types::parse_shape) {
            if result.scalar() != lhs.scalar() {
                self.error(format!(
                    "{op} in block '{block_id}' produces scalar '{}' from '{}' operands",
                    result.scalar(),
                    lhs.scalar()
                ));
            }
        }
    }

    fn check_swizzle(&mut self, block_id: &str, instruction: &IrInstruction) {
        let Some(tag) = instruction.tag.as_deref() else {
            self.error(format!("Swizzle in block '{block_id}' has no lane tag"));
            return;
        };
        if instruction.swizzle_lanes().is_none() {
            self.error(format!(
                "Swizzle in block '{block_id}' has invalid lane tag '{tag}'"
            ));
            return;
        }
        let source = instruction
            .operands
            .first()
            .and_then(|&id| self.operand_shape(id));
        let result = instruction.ty.as_deref().and_then(types::parse_shape);
        let (Some(source), Some(result)) = (source, result) else {
            return;
        };
        if source.scalar() != result.scalar() {
            self.error(format!(
                "Swizzle in block '{block_id}' changes scalar '{}' to '{}'",
                source.scalar(),
                result.scalar()
            ));
        }
        if result.component_count() != tag.chars().count() {
            self.error(format!(
                "Swizzle in block '{block_id}' produces {} components from tag '{tag}'",
                result.component_count()
            ));
        }
    }

    fn check_store(&mut self, block_id: &str, instruction: &IrInstruction) {
        if !matches!(instruction.operands.len(), 2 | 3) {
            self.error(format!(
                "Store in block '{block_id}' takes 2 or 3 operands, found {}",
                instruction.operands.len()
            ));
            return;
        }
        let target = instruction.operands[0];
        let stored = instruction.operands[instruction.operands.len() - 1];
        let Some(target_value) = self.values.get(&target).copied() else {
            return;
        };
        // Resource destinations have opaque element types
        if types::is_resource_type(&target_value.ty) {
            return;
        }
        let (Some(target_shape), Some(stored_shape)) =
            (self.operand_shape(target), self.operand_shape(stored))
        else {
            return;
        };
        if target_shape.scalar() != stored_shape.scalar()
            || !target_shape.scalar().is_numeric()
        {
            self.error(format!(
                "Store in block '{block_id}' writes scalar '{}' into '{}'",
                stored_shape.scalar(),
                target_shape.scalar()
            ));
        }
    }

    fn check_return(
        &mut self,
        function: &IrFunction,
        block_id: &str,
        instruction: &IrInstruction,
    ) {
        let Some(&operand) = instruction.operands.first() else {
            return;
        };
        let (Some(actual), Some(declared)) = (
            self.operand_shape(operand),
            types::parse_shape(&function.return_type),
        ) else {
            return;
        };
        if actual.scalar() != declared.scalar()
            || actual.component_count() != declared.component_count()
        {
            self.error(format!(
                "Return in block '{block_id}' yields '{actual}' from a function returning '{declared}'"
            ));
        }
    }

    // ------------------------------------------------------------------
    // Back-end leakage
    // ------------------------------------------------------------------

    fn scan(&mut self, text: &str, context: &str) {
        if let Some(found) = leak_pattern().find(text) {
            self.error(format!(
                "backend token '{}' leaked into {context}",
                found.as_str().to_ascii_lowercase()
            ));
        }
    }

    fn check_leaks(&mut self) {
        let module = self.module;
        self.scan(&module.profile, "module profile");
        if let Some(entry) = &module.entry_point {
            self.scan(&entry.name, "entry point name");
            self.scan(&entry.stage.to_string(), "entry point stage");
        }
        for value in &module.values {
            self.scan(&value.ty, "value type");
            if let Some(name) = &value.name {
                self.scan(name, "value name");
            }
        }
        for resource in &module.resources {
            self.scan(&resource.name, "resource name");
            self.scan(resource.kind.name(), "resource kind");
            self.scan(&resource.ty, "resource type");
        }
        for function in &module.functions {
            for block in &function.blocks {
                for instruction in &block.instructions {
                    self.scan(instruction.op.name(), "instruction op");
                    if let Some(tag) = &instruction.tag {
                        self.scan(tag, "instruction tag");
                    }
                    if let Some(ty) = &instruction.ty {
                        self.scan(ty, "instruction type");
                    }
                }
            }
        }
        for technique in &module.techniques {
            self.scan(&technique.name, "technique name");
            for pass in &technique.passes {
                self.scan(&pass.name, "pass name");
                for binding in &pass.shader_bindings {
                    self.scan(&binding.entry, "shader binding entry");
                    if let Some(profile) = &binding.profile {
                        self.scan(profile, "shader binding profile");
                    }
                }
                for state in &pass.state_assignments {
                    self.scan(&state.name, "state name");
                    self.scan(&state.value, "state value");
                }
            }
        }
    }
}
