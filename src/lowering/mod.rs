//! # Lowering Pipeline
//!
//! Semantic model -> IR conversion. Resolves the profile and entry
//! point, lowers global resources and entry parameters into the value
//! table, then walks the entry function's statement graph emitting
//! typed instructions into basic blocks.
//!
//! ```text
//! SemanticModel -> [Lowerer] -> IrModule -> Invariant Validator
//! ```
//!
//! Lowering never aborts: every unresolved reference or unsupported
//! construct appends an Error diagnostic and the walk continues with a
//! best-effort module (substituting `Undef` values where an operand is
//! required).

use crate::ir::{
    Diagnostic, EntryPoint, IrBlock, IrFunction, IrInstruction, IrModule, IrResource, IrValue, Op,
    Stage, ValueId, ValueKind,
};
use crate::semantic::{NodeId, SemEntryPoint, SemSymbol, SemanticModel, SyntaxNode};
use std::collections::HashMap;

mod expr;
pub mod intrinsics;
mod stmt;

/// Inputs of one lowering run
#[derive(Debug, Clone, Default)]
pub struct LowerRequest {
    /// The semantic document produced by the front-end
    pub semantic: SemanticModel,
    /// Overrides the document's profile tag
    pub profile: Option<String>,
    /// Selects an entry point by name, case-insensitively
    pub entry: Option<String>,
}

/// Lower a semantic model into an IR module.
///
/// The returned module carries every diagnostic produced along the way;
/// the caller appends invariant-validator output separately.
pub fn lower_semantic(request: &LowerRequest) -> IrModule {
    let profile = request
        .profile
        .clone()
        .or_else(|| request.semantic.profile.clone())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::debug!(profile = %profile, "lowering semantic model");

    let mut lowerer = Lowerer::new(&request.semantic, profile);
    lowerer.run(request.entry.as_deref());
    lowerer.module
}

/// Walks the semantic document and accumulates the module.
///
/// Holds the id-indexed views of the document plus the per-function
/// block state (a mutable current block and a label counter).
pub(crate) struct Lowerer<'a> {
    semantic: &'a SemanticModel,
    symbols: HashMap<NodeId, &'a SemSymbol>,
    nodes: HashMap<NodeId, &'a SyntaxNode>,
    node_types: HashMap<NodeId, &'a str>,
    /// Semantic symbol id -> IR value id
    symbol_values: HashMap<NodeId, ValueId>,
    module: IrModule,
    /// Finished blocks of the function being lowered
    blocks: Vec<IrBlock>,
    /// Block currently receiving instructions; `None` after a terminator
    current: Option<IrBlock>,
    label_counter: u32,
    /// Declared return type of the function being lowered
    return_type: String,
}

impl<'a> Lowerer<'a> {
    fn new(semantic: &'a SemanticModel, profile: String) -> Lowerer<'a> {
        Lowerer {
            semantic,
            symbols: semantic.symbol_map(),
            nodes: semantic.node_map(),
            node_types: semantic.type_map(),
            symbol_values: HashMap::new(),
            module: IrModule::new(profile),
            blocks: Vec::new(),
            current: None,
            label_counter: 0,
            return_type: String::new(),
        }
    }

    fn run(&mut self, entry_override: Option<&str>) {
        let entry = self.resolve_entry(entry_override);
        if let Some(entry) = entry {
            self.module.entry_point = Some(EntryPoint {
                name: entry.name.clone(),
                stage: entry.stage.unwrap_or_default(),
            });
        }

        let entry_symbol = entry.and_then(|e| self.resolve_entry_symbol(e));

        self.lower_resources();
        self.module.techniques = self.semantic.techniques.clone();

        if let (Some(entry), Some(symbol)) = (entry, entry_symbol) {
            let parameters = self.lower_parameters(symbol);
            self.lower_body(&entry.name, symbol, parameters);
        }
    }

    // ------------------------------------------------------------------
    // Entry resolution
    // ------------------------------------------------------------------

    fn resolve_entry(&mut self, entry_override: Option<&str>) -> Option<&'a SemEntryPoint> {
        let entry = match entry_override {
            Some(name) => self
                .semantic
                .entry_points
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(name)),
            None => self.semantic.entry_points.first(),
        };
        if entry.is_none() {
            let wanted = entry_override.unwrap_or("<first>");
            self.error(format!("no entry point found matching '{wanted}'"));
        }
        entry
    }

    fn resolve_entry_symbol(&mut self, entry: &SemEntryPoint) -> Option<&'a SemSymbol> {
        let symbol = entry
            .symbol_id
            .and_then(|id| self.symbols.get(&id).copied())
            .or_else(|| {
                self.semantic
                    .symbols
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(&entry.name))
            });
        if symbol.is_none() {
            self.error(format!(
                "entry point '{}' has no backing symbol",
                entry.name
            ));
        }
        symbol
    }

    // ------------------------------------------------------------------
    // Resources and parameters
    // ------------------------------------------------------------------

    fn lower_resources(&mut self) {
        let resource_symbols: Vec<&SemSymbol> = self
            .semantic
            .symbols
            .iter()
            .filter(|s| is_resource_kind(&s.kind))
            .collect();
        for symbol in resource_symbols {
            let ty = symbol.ty.clone().unwrap_or_else(|| "unknown".to_string());
            self.module.resources.push(IrResource {
                name: symbol.name.clone(),
                kind: symbol.kind.clone(),
                ty: ty.clone(),
                writable: ty.starts_with("RW"),
            });
            self.bind_symbol_value(symbol);
        }
    }

    fn lower_parameters(&mut self, entry_symbol: &SemSymbol) -> Vec<ValueId> {
        let params: Vec<&SemSymbol> = self
            .semantic
            .symbols
            .iter()
            .filter(|s| {
                s.kind == ValueKind::Parameter && s.parent_symbol_id == Some(entry_symbol.id)
            })
            .collect();
        params.into_iter().map(|p| self.bind_symbol_value(p)).collect()
    }

    /// Register the IR value backing a semantic symbol, preferring the
    /// symbol's own id so resources and parameters keep their identity
    /// across the boundary.
    fn bind_symbol_value(&mut self, symbol: &SemSymbol) -> ValueId {
        if let Some(&id) = self.symbol_values.get(&symbol.id) {
            return id;
        }
        let ty = symbol.ty.clone().unwrap_or_else(|| "unknown".to_string());
        let id = if symbol.id > 0 && self.module.value(symbol.id).is_none() {
            symbol.id
        } else {
            self.module.next_value_id()
        };
        self.module.values.push(IrValue {
            id,
            ty,
            kind: symbol.kind.clone(),
            name: Some(symbol.name.clone()),
            semantic: symbol.semantic.as_ref().map(super::semantic::SemanticBinding::format),
        });
        self.symbol_values.insert(symbol.id, id);
        id
    }

    // ------------------------------------------------------------------
    // Function body
    // ------------------------------------------------------------------

    fn lower_body(&mut self, name: &str, symbol: &SemSymbol, parameters: Vec<ValueId>) {
        let return_type = symbol.ty.clone().unwrap_or_else(|| "unknown".to_string());
        self.blocks = Vec::new();
        self.current = Some(IrBlock::new("entry"));
        self.label_counter = 0;
        self.return_type = return_type.clone();

        let body = symbol
            .decl_node_id
            .and_then(|id| self.nodes.get(&id).copied())
            .and_then(|decl| decl.child("body"))
            .and_then(|id| self.nodes.get(&id).copied());
        match body {
            Some(body) => self.lower_statement(body),
            None => self.error(format!("entry '{name}' has no function body")),
        }

        self.finalize_function(&return_type, &parameters);

        let blocks = std::mem::take(&mut self.blocks);
        self.module.functions.push(IrFunction {
            name: name.to_string(),
            return_type,
            parameters,
            blocks,
        });
    }

    /// Synthesize a trailing `Return` when control can still fall off
    /// the end of the function.
    fn finalize_function(&mut self, return_type: &str, parameters: &[ValueId]) {
        if self.current.is_none() {
            return;
        }
        let operand = match parameters.first() {
            Some(&p) => Some(p),
            None if return_type != "void" => Some(self.undef(return_type)),
            None => None,
        };
        self.append(IrInstruction::new(Op::Return).with_operands(operand.into_iter().collect()));
    }

    // ------------------------------------------------------------------
    // Block state
    // ------------------------------------------------------------------

    /// Append an instruction to the current block. Terminators close the
    /// block; anything arriving after a terminator (unreachable code) is
    /// dropped by the statement walk before it gets here.
    fn append(&mut self, instruction: IrInstruction) {
        if instruction.terminator {
            if let Some(mut block) = self.current.take() {
                block.instructions.push(instruction);
                self.blocks.push(block);
            }
        } else if let Some(block) = self.current.as_mut() {
            block.instructions.push(instruction);
        }
    }

    /// Open a new block. An unterminated predecessor falls through with
    /// an explicit `Branch` so every block keeps exactly one terminator.
    fn start_block(&mut self, id: &str) {
        if self.current.is_some() {
            self.append(IrInstruction::new(Op::Branch).with_tag(id));
        }
        self.current = Some(IrBlock::new(id));
    }

    fn has_open_block(&self) -> bool {
        self.current.is_some()
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{prefix}{}", self.label_counter)
    }

    // ------------------------------------------------------------------
    // Values and diagnostics
    // ------------------------------------------------------------------

    fn node_type(&self, id: NodeId) -> String {
        self.node_types
            .get(&id)
            .map_or_else(|| "unknown".to_string(), |t| (*t).to_string())
    }

    fn fresh_temp(&mut self, ty: impl Into<String>) -> ValueId {
        self.module.alloc_value(ValueKind::Temp, ty, None)
    }

    fn undef(&mut self, ty: impl Into<String>) -> ValueId {
        self.module.alloc_value(ValueKind::Undef, ty, None)
    }

    fn constant(&mut self, ty: impl Into<String>, text: impl Into<String>) -> ValueId {
        self.module
            .alloc_value(ValueKind::Constant, ty, Some(text.into()))
    }

    fn error(&mut self, message: impl Into<String>) {
        self.module
            .diagnostics
            .push(Diagnostic::error(Stage::Lower, message));
    }
}

/// Symbol kinds lowered as global resources
fn is_resource_kind(kind: &ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::Sampler | ValueKind::CBuffer | ValueKind::Buffer | ValueKind::GlobalVariable
    ) || kind.is_texture()
}
