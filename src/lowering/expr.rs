//! Expression lowering.
//!
//! Each expression node lowers to at most one instruction producing a
//! fresh SSA value. Failed sub-expressions lower to `Undef` operands so
//! a single broken reference does not cascade errors up the tree.

use super::Lowerer;
use crate::ir::{IrInstruction, Op, ValueId, ValueKind};
use crate::lowering::intrinsics::intrinsic_op;
use crate::semantic::{NodeId, SemSymbol, SyntaxNode};

/// Destination of an assignment
enum LValue {
    /// A plain SSA value (parameter, local); assignment defines it
    Direct(ValueId),
    /// Memory-backed destination written through `Store`
    Memory {
        target: ValueId,
        index: Option<ValueId>,
        tag: Option<String>,
    },
}

impl<'a> Lowerer<'a> {
    pub(super) fn lower_expr(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        match node.kind.as_str() {
            "Identifier" | "IdentifierExpression" => self.lower_identifier(node),
            "MemberAccessExpression" => self.lower_member_access(node),
            "LiteralExpression" => self.lower_literal(node),
            "UnaryExpression" => self.lower_unary(node),
            "BinaryExpression" => self.lower_binary(node),
            "CallExpression" => self.lower_call(node),
            "CastExpression" => self.lower_cast(node),
            "IndexExpression" => self.lower_index(node),
            other => {
                self.error(format!("unsupported expression kind '{other}'"));
                None
            }
        }
    }

    /// Lower a child expression, substituting a typed `Undef` when it
    /// fails so enclosing constructs keep their operand counts.
    pub(super) fn lower_operand(&mut self, node_id: Option<NodeId>) -> ValueId {
        let node = node_id.and_then(|id| self.nodes.get(&id).copied());
        let lowered = match node {
            Some(node) => self.lower_expr(node),
            None => None,
        };
        match lowered {
            Some(value) => value,
            None => {
                let ty = node_id.map_or_else(|| "unknown".to_string(), |id| self.node_type(id));
                self.undef(ty)
            }
        }
    }

    // ------------------------------------------------------------------
    // Identifiers and member access
    // ------------------------------------------------------------------

    fn lower_identifier(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        if let Some(sym_id) = node.referenced_symbol_id {
            let Some(&symbol) = self.symbols.get(&sym_id) else {
                self.error(format!("identifier references unknown symbol {sym_id}"));
                return None;
            };
            return self.lower_symbol_ref(node, symbol, None);
        }

        // No backing symbol: infer by type uniqueness among field-like
        // symbols, erring when the type matches none or several.
        let ty = self.node_type(node.id);
        let candidates: Vec<&'a SemSymbol> = self
            .semantic
            .symbols
            .iter()
            .filter(|s| {
                matches!(s.kind, ValueKind::StructMember | ValueKind::CBufferMember)
                    && s.ty.as_deref() == Some(ty.as_str())
            })
            .collect();
        match candidates.as_slice() {
            [symbol] => self.lower_symbol_ref(node, symbol, None),
            [] => {
                self.error("identifier has no backing symbol and no unique field of its type");
                None
            }
            _ => {
                self.error(format!(
                    "identifier is ambiguous: {} fields share type '{ty}'",
                    candidates.len()
                ));
                None
            }
        }
    }

    fn lower_member_access(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        if let Some(sym_id) = node.referenced_symbol_id {
            let Some(&symbol) = self.symbols.get(&sym_id) else {
                self.error(format!("member access references unknown symbol {sym_id}"));
                return None;
            };
            return self.lower_symbol_ref(node, symbol, node.swizzle.as_deref());
        }

        // Pure swizzle over an arbitrary source expression
        let Some(swizzle) = node.swizzle.clone() else {
            self.error("member access has neither a referenced symbol nor a swizzle");
            return None;
        };
        let source = self.lower_operand(node.child("target"));
        let ty = self.node_type(node.id);
        let result = self.fresh_temp(ty.clone());
        self.append(
            IrInstruction::new(Op::Swizzle)
                .with_operands(vec![source])
                .with_result(result, ty)
                .with_tag(swizzle),
        );
        Some(result)
    }

    /// Loadable symbols round-trip through `Load`; everything else (a
    /// parameter, a local) is its value directly.
    fn lower_symbol_ref(
        &mut self,
        node: &SyntaxNode,
        symbol: &SemSymbol,
        swizzle: Option<&str>,
    ) -> Option<ValueId> {
        let source = self.bind_symbol_value(symbol);
        if !is_loadable_kind(&symbol.kind) {
            return Some(source);
        }
        let ty = self
            .node_types
            .get(&node.id)
            .map(|t| (*t).to_string())
            .or_else(|| symbol.ty.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let result = self.fresh_temp(ty.clone());
        let mut instruction = IrInstruction::new(Op::Load)
            .with_operands(vec![source])
            .with_result(result, ty);
        if let Some(swizzle) = swizzle {
            instruction = instruction.with_tag(swizzle);
        }
        self.append(instruction);
        Some(result)
    }

    // ------------------------------------------------------------------
    // Literals, unary, binary
    // ------------------------------------------------------------------

    fn lower_literal(&mut self, node: &SyntaxNode) -> Option<ValueId> {
        let Some(text) = node.literal.clone() else {
            self.error("literal expression carries no text");
            return None;
        };
        let ty = self.node_type(node.id);
        Some(self.constant(ty, text))
    }

    fn lower_unary(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        let operator = node.operator.as_deref().unwrap_or("");
        let op = match operator {
            "-" => Op::Negate,
            "!" => Op::Not,
            "~" => Op::BitNot,
            "+" => {
                // Unary plus is the identity; no instruction
                return Some(self.lower_operand(node.child("operand")));
            }
            other => {
                self.error(format!("unsupported unary operator '{other}'"));
                return None;
            }
        };
        let operand = self.lower_operand(node.child("operand"));
        let ty = self.node_type(node.id);
        let result = self.fresh_temp(ty.clone());
        self.append(
            IrInstruction::new(op)
                .with_operands(vec![operand])
                .with_result(result, ty),
        );
        Some(result)
    }

    fn lower_binary(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        let operator = node.operator.clone().unwrap_or_default();
        if operator == "=" || is_compound_assignment(&operator) {
            return self.lower_assignment(node, &operator);
        }
        let Some(op) = binary_op(&operator) else {
            self.error(format!("unsupported binary operator '{operator}'"));
            return None;
        };

        let lhs = self.lower_operand(node.child("left"));
        let rhs = self.lower_operand(node.child("right"));
        let mut ty = self.node_type(node.id);
        if ty == "unknown" && (op.is_comparison() || matches!(op, Op::LogicalAnd | Op::LogicalOr)) {
            ty = "bool".to_string();
        }
        let result = self.fresh_temp(ty.clone());
        self.append(
            IrInstruction::new(op)
                .with_operands(vec![lhs, rhs])
                .with_result(result, ty),
        );
        Some(result)
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn lower_assignment(&mut self, node: &'a SyntaxNode, operator: &str) -> Option<ValueId> {
        let value = if let Some(op) = compound_op(operator) {
            // `a += b` lowers as the binary op followed by the write
            let lhs = self.lower_operand(node.child("left"));
            let rhs = self.lower_operand(node.child("right"));
            let ty = self.node_type(node.id);
            let result = self.fresh_temp(ty.clone());
            self.append(
                IrInstruction::new(op)
                    .with_operands(vec![lhs, rhs])
                    .with_result(result, ty),
            );
            result
        } else {
            self.lower_operand(node.child("right"))
        };

        let target_node = node
            .child("left")
            .and_then(|id| self.nodes.get(&id).copied());
        let Some(target_node) = target_node else {
            self.error("assignment has no left-hand side");
            return Some(value);
        };
        match self.lower_lvalue(target_node) {
            Some(LValue::Direct(target)) => {
                let ty = self
                    .module
                    .value(target)
                    .map_or_else(|| "unknown".to_string(), |v| v.ty.clone());
                self.append(
                    IrInstruction::new(Op::Assign)
                        .with_operands(vec![value])
                        .with_result(target, ty),
                );
            }
            Some(LValue::Memory { target, index, tag }) => {
                let operands = match index {
                    Some(index) => vec![target, index, value],
                    None => vec![target, value],
                };
                let mut instruction = IrInstruction::new(Op::Store).with_operands(operands);
                if let Some(tag) = tag {
                    instruction = instruction.with_tag(tag);
                }
                self.append(instruction);
            }
            None => {}
        }
        Some(value)
    }

    fn lower_lvalue(&mut self, node: &'a SyntaxNode) -> Option<LValue> {
        match node.kind.as_str() {
            "Identifier" | "IdentifierExpression" | "MemberAccessExpression" => {
                let symbol = node
                    .referenced_symbol_id
                    .and_then(|id| self.symbols.get(&id).copied());
                if let Some(symbol) = symbol {
                    let target = self.bind_symbol_value(symbol);
                    if is_memory_kind(&symbol.kind) {
                        return Some(LValue::Memory {
                            target,
                            index: None,
                            tag: node.swizzle.clone(),
                        });
                    }
                    return Some(LValue::Direct(target));
                }
                if node.kind == "MemberAccessExpression" {
                    // Swizzled write through an arbitrary target
                    let target = self.lower_operand(node.child("target"));
                    return Some(LValue::Memory {
                        target,
                        index: None,
                        tag: node.swizzle.clone(),
                    });
                }
                self.error("assignment target has no backing symbol");
                None
            }
            "IndexExpression" => {
                let base_node = node
                    .child("target")
                    .and_then(|id| self.nodes.get(&id).copied());
                let base = match base_node {
                    Some(base_node) => match base_node
                        .referenced_symbol_id
                        .and_then(|id| self.symbols.get(&id).copied())
                    {
                        // Resource bases are written directly, never loaded first
                        Some(symbol) => self.bind_symbol_value(symbol),
                        None => self.lower_operand(Some(base_node.id)),
                    },
                    None => {
                        self.error("indexed assignment has no base expression");
                        return None;
                    }
                };
                let index = self.lower_operand(node.child("index"));
                Some(LValue::Memory {
                    target: base,
                    index: Some(index),
                    tag: None,
                })
            }
            other => {
                self.error(format!("unsupported assignment target kind '{other}'"));
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Calls, casts, indexing
    // ------------------------------------------------------------------

    fn lower_call(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        let Some(callee) = node.callee_name.clone() else {
            self.error("call expression has no callee name");
            return None;
        };
        let arguments: Vec<ValueId> = node
            .children_with_role("argument")
            .collect::<Vec<_>>()
            .into_iter()
            .map(|id| self.lower_operand(Some(id)))
            .collect();
        let ty = self.node_type(node.id);

        let op = if node.callee_kind.as_deref() == Some("Intrinsic") {
            match intrinsic_op(&callee) {
                Some(op) => op,
                None => {
                    self.error(format!("unsupported intrinsic '{callee}'"));
                    Op::Call
                }
            }
        } else {
            Op::Call
        };

        let mut instruction = IrInstruction::new(op)
            .with_operands(arguments)
            .with_tag(callee);
        let result = if ty == "void" {
            None
        } else {
            let result = self.fresh_temp(ty.clone());
            instruction = instruction.with_result(result, ty);
            Some(result)
        };
        self.append(instruction);
        result
    }

    fn lower_cast(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        let operand = self.lower_operand(node.child("operand"));
        let ty = self.node_type(node.id);
        let result = self.fresh_temp(ty.clone());
        self.append(
            IrInstruction::new(Op::Cast)
                .with_operands(vec![operand])
                .with_result(result, ty),
        );
        Some(result)
    }

    fn lower_index(&mut self, node: &'a SyntaxNode) -> Option<ValueId> {
        let base = self.lower_operand(node.child("target"));
        let index = self.lower_operand(node.child("index"));
        let ty = self.node_type(node.id);
        let result = self.fresh_temp(ty.clone());
        self.append(
            IrInstruction::new(Op::Index)
                .with_operands(vec![base, index])
                .with_result(result, ty),
        );
        Some(result)
    }
}

/// Symbols whose reads round-trip through `Load`
fn is_loadable_kind(kind: &ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::GlobalVariable
            | ValueKind::CBuffer
            | ValueKind::Buffer
            | ValueKind::StructMember
            | ValueKind::CBufferMember
    )
}

/// Symbols whose writes go through `Store`
fn is_memory_kind(kind: &ValueKind) -> bool {
    is_loadable_kind(kind) || kind.is_texture() || matches!(kind, ValueKind::Resource)
}

fn binary_op(operator: &str) -> Option<Op> {
    let op = match operator {
        "+" => Op::Add,
        "-" => Op::Sub,
        "*" => Op::Mul,
        "/" => Op::Div,
        "%" => Op::Mod,
        "==" => Op::Eq,
        "!=" => Op::Ne,
        "<" => Op::Lt,
        "<=" => Op::Le,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        "&&" => Op::LogicalAnd,
        "||" => Op::LogicalOr,
        _ => return None,
    };
    Some(op)
}

fn is_compound_assignment(operator: &str) -> bool {
    matches!(operator, "+=" | "-=" | "*=" | "/=" | "%=")
}

fn compound_op(operator: &str) -> Option<Op> {
    let op = match operator {
        "+=" => Op::Add,
        "-=" => Op::Sub,
        "*=" => Op::Mul,
        "/=" => Op::Div,
        "%=" => Op::Mod,
        _ => return None,
    };
    Some(op)
}
