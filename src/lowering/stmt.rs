//! Statement and control-flow lowering.
//!
//! Structured control flow becomes explicit basic blocks joined by
//! `Branch`/`BranchCond` terminators. Labels come from a per-function
//! counter (`then1`, `else2`, `merge3`, `while.cond4`, ...). Statements
//! reached after a terminator (code following `return`) are ignored.

use super::Lowerer;
use crate::ir::{cond_tag, IrInstruction, Op, ValueId};
use crate::semantic::{NodeId, SyntaxNode};

impl<'a> Lowerer<'a> {
    pub(super) fn lower_statement(&mut self, node: &'a SyntaxNode) {
        if !self.has_open_block() {
            // Unreachable statement after a terminator
            return;
        }
        match node.kind.as_str() {
            "BlockStatement" => {
                let statements: Vec<NodeId> = node.children_with_role("statement").collect();
                for id in statements {
                    match self.nodes.get(&id).copied() {
                        Some(statement) => self.lower_statement(statement),
                        None => self.error(format!("block references unknown statement node {id}")),
                    }
                }
            }
            "ExpressionStatement" => {
                if let Some(id) = node.child("expression") {
                    self.lower_operand(Some(id));
                }
            }
            "ReturnStatement" => self.lower_return(node),
            "IfStatement" => self.lower_if(node),
            "WhileStatement" => self.lower_while(node),
            "DoWhileStatement" => self.lower_do_while(node),
            "ForStatement" => self.lower_for(node),
            "VariableDeclarationStatement" | "DeclarationStatement" => self.lower_declaration(node),
            "DiscardStatement" => {
                self.append(IrInstruction::new(Op::Call).with_tag("discard"));
            }
            other => self.error(format!("unsupported statement kind '{other}'")),
        }
    }

    fn lower_return(&mut self, node: &'a SyntaxNode) {
        let operand = match node.child("expression") {
            Some(id) => Some(self.lower_operand(Some(id))),
            None if self.return_type != "void" => {
                let ty = self.return_type.clone();
                Some(self.undef(ty))
            }
            None => None,
        };
        self.append(IrInstruction::new(Op::Return).with_operands(operand.into_iter().collect()));
    }

    fn lower_if(&mut self, node: &'a SyntaxNode) {
        let condition = self.lower_condition(node.child("condition"));

        let has_else = node.child("else").is_some();
        let then_label = self.fresh_label("then");
        let else_label = if has_else {
            Some(self.fresh_label("else"))
        } else {
            None
        };
        let merge_label = self.fresh_label("merge");
        // With no else branch the false edge falls through to the merge
        let else_target = else_label.clone().unwrap_or_else(|| merge_label.clone());

        self.append(
            IrInstruction::new(Op::BranchCond)
                .with_operands(vec![condition])
                .with_tag(cond_tag(&then_label, &else_target)),
        );

        self.start_block(&then_label);
        self.lower_branch_body(node.child("then"));
        let mut merge_reached = false;
        if self.has_open_block() {
            self.append(IrInstruction::new(Op::Branch).with_tag(&merge_label));
            merge_reached = true;
        }

        if let Some(else_label) = else_label {
            self.start_block(&else_label);
            self.lower_branch_body(node.child("else"));
            if self.has_open_block() {
                self.append(IrInstruction::new(Op::Branch).with_tag(&merge_label));
                merge_reached = true;
            }
        } else {
            // The BranchCond's false edge targets the merge directly
            merge_reached = true;
        }

        // Skip the merge block entirely when both branches terminated;
        // anything after this statement is unreachable.
        if merge_reached {
            self.start_block(&merge_label);
        }
    }

    fn lower_while(&mut self, node: &'a SyntaxNode) {
        let cond_label = self.fresh_label("while.cond");
        let body_label = self.fresh_label("while.body");
        let exit_label = self.fresh_label("while.exit");

        self.append(IrInstruction::new(Op::Branch).with_tag(&cond_label));
        self.start_block(&cond_label);
        let condition = self.lower_condition(node.child("condition"));
        self.append(
            IrInstruction::new(Op::BranchCond)
                .with_operands(vec![condition])
                .with_tag(cond_tag(&body_label, &exit_label)),
        );

        self.start_block(&body_label);
        self.lower_branch_body(node.child("body"));
        if self.has_open_block() {
            self.append(IrInstruction::new(Op::Branch).with_tag(&cond_label));
        }

        self.start_block(&exit_label);
    }

    fn lower_do_while(&mut self, node: &'a SyntaxNode) {
        let body_label = self.fresh_label("do.body");
        let cond_label = self.fresh_label("do.cond");
        let exit_label = self.fresh_label("do.exit");

        self.append(IrInstruction::new(Op::Branch).with_tag(&body_label));
        self.start_block(&body_label);
        self.lower_branch_body(node.child("body"));
        if self.has_open_block() {
            self.append(IrInstruction::new(Op::Branch).with_tag(&cond_label));
        }

        self.start_block(&cond_label);
        let condition = self.lower_condition(node.child("condition"));
        self.append(
            IrInstruction::new(Op::BranchCond)
                .with_operands(vec![condition])
                .with_tag(cond_tag(&body_label, &exit_label)),
        );

        self.start_block(&exit_label);
    }

    fn lower_for(&mut self, node: &'a SyntaxNode) {
        if let Some(init_id) = node.child("initializer") {
            self.lower_inline(init_id);
        }

        let cond_label = self.fresh_label("for.cond");
        let body_label = self.fresh_label("for.body");
        let incr_label = self.fresh_label("for.incr");
        let exit_label = self.fresh_label("for.exit");

        self.append(IrInstruction::new(Op::Branch).with_tag(&cond_label));
        self.start_block(&cond_label);
        let condition = match node.child("condition") {
            Some(id) => self.lower_operand(Some(id)),
            // `for(;;)` has a vacuously true condition
            None => self.constant("bool", "true"),
        };
        self.append(
            IrInstruction::new(Op::BranchCond)
                .with_operands(vec![condition])
                .with_tag(cond_tag(&body_label, &exit_label)),
        );

        self.start_block(&body_label);
        self.lower_branch_body(node.child("body"));
        // Body falls through to the increment block
        self.start_block(&incr_label);
        if let Some(incr_id) = node.child("increment") {
            self.lower_inline(incr_id);
        }
        self.append(IrInstruction::new(Op::Branch).with_tag(&cond_label));

        self.start_block(&exit_label);
    }

    fn lower_declaration(&mut self, node: &'a SyntaxNode) {
        let symbol = node
            .referenced_symbol_id
            .and_then(|id| self.symbols.get(&id).copied());
        let Some(symbol) = symbol else {
            self.error("declaration statement references no symbol");
            return;
        };
        let target = self.bind_symbol_value(symbol);
        if let Some(init) = node.child("initializer") {
            let value = self.lower_operand(Some(init));
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
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Lower a then/else/body child, accepting both single statements
    /// and blocks.
    fn lower_branch_body(&mut self, node_id: Option<NodeId>) {
        if let Some(node) = node_id.and_then(|id| self.nodes.get(&id).copied()) {
            self.lower_statement(node);
        }
    }

    /// Lower a for-initializer or for-increment in the current block; the
    /// child may be a declaration, an expression statement, or a bare
    /// expression.
    fn lower_inline(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.get(&node_id).copied() else {
            self.error(format!("reference to unknown syntax node {node_id}"));
            return;
        };
        if node.kind.ends_with("Statement") {
            self.lower_statement(node);
        } else {
            self.lower_expr(node);
        }
    }

    fn lower_condition(&mut self, node_id: Option<NodeId>) -> ValueId {
        match node_id {
            Some(id) => self.lower_operand(Some(id)),
            None => {
                self.error("control-flow statement is missing its condition");
                self.undef("bool")
            }
        }
    }
}
