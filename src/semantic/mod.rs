//! # Semantic Model Document
//!
//! Wire types for the semantic model the upstream HLSL front-end emits:
//! a typed abstract syntax graph with resolved symbols, per-node types,
//! entry points, and technique metadata. This crate only reads the
//! fields the lowering pipeline consults; unknown fields are ignored so
//! front-end additions do not break older middle-ends.

use crate::ir::{IrTechnique, ShaderStage, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a syntax node or symbol inside the semantic document
pub type NodeId = u64;

/// Root of the semantic-model document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticModel {
    /// Profile tag suggested by the front-end (`ps_2_0`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub entry_points: Vec<SemEntryPoint>,
    #[serde(default)]
    pub symbols: Vec<SemSymbol>,
    /// Bindings from expression nodes to their resolved type descriptors
    #[serde(default)]
    pub types: Vec<TypeBinding>,
    #[serde(default)]
    pub syntax: SyntaxTree,
    /// Effect techniques, forwarded verbatim into the IR module
    #[serde(default)]
    pub techniques: Vec<IrTechnique>,
}

/// A candidate entry function reported by the front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemEntryPoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<ShaderStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_id: Option<NodeId>,
}

/// Semantic binding attached to a parameter or output (`POSITION`, 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl SemanticBinding {
    /// Concatenated form used on IR values: name `POSITION`, index 0
    /// formats as `POSITION0`
    pub fn format(&self) -> String {
        match self.index {
            Some(index) => format!("{}{index}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A resolved symbol: function, parameter, global, resource, or member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemSymbol {
    pub id: NodeId,
    /// Shares the closed kind vocabulary with IR values
    pub kind: ValueKind,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_symbol_id: Option<NodeId>,
    /// Declaration site in the syntax graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl_node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticBinding>,
}

/// `nodeId -> type` binding for an expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBinding {
    pub node_id: NodeId,
    #[serde(rename = "type")]
    pub ty: String,
}

/// The syntax graph portion of the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxTree {
    #[serde(default)]
    pub nodes: Vec<SyntaxNode>,
}

/// Role-tagged edge to a child node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRef {
    pub role: String,
    pub node_id: NodeId,
}

/// One node of the abstract syntax graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxNode {
    pub id: NodeId,
    /// Node kind (`BinaryExpression`, `IfStatement`, ...)
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<ChildRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swizzle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_symbol_id: Option<NodeId>,
    /// Literal text for `LiteralExpression` nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl SyntaxNode {
    /// First child with the given role
    pub fn child(&self, role: &str) -> Option<NodeId> {
        self.children
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.node_id)
    }

    /// All children with the given role, in order
    pub fn children_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children
            .iter()
            .filter(move |c| c.role == role)
            .map(|c| c.node_id)
    }
}

impl SemanticModel {
    /// Index symbols by id
    pub fn symbol_map(&self) -> HashMap<NodeId, &SemSymbol> {
        self.symbols.iter().map(|s| (s.id, s)).collect()
    }

    /// Index syntax nodes by id
    pub fn node_map(&self) -> HashMap<NodeId, &SyntaxNode> {
        self.syntax.nodes.iter().map(|n| (n.id, n)).collect()
    }

    /// Index resolved types by node id
    pub fn type_map(&self) -> HashMap<NodeId, &str> {
        self.types
            .iter()
            .map(|b| (b.node_id, b.ty.as_str()))
            .collect()
    }
}
