//! # Constant Parsing and Canonical Formatting
//!
//! Constants live in the IR as values of kind `Constant` whose `name`
//! holds the literal text (`5`, `true`, `float3(1,2,3)`). This module
//! parses that text eagerly into a typed [`ConstantData`] so the
//! optimizer never re-parses strings mid-pass, and renders the canonical
//! textual form back (invariant formatting, no trailing zeroes).

use super::types::{self, ScalarKind, TypeShape};

/// A parsed constant: shape plus element values in row-major order.
///
/// Elements are stored as `f64` regardless of scalar kind; booleans are
/// 1/0. The scalar kind is retained in `shape` for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantData {
    /// Declared shape of the constant
    pub shape: TypeShape,
    /// One entry per component, row-major for matrices
    pub elements: Vec<f64>,
}

impl ConstantData {
    /// Constant with every element set to `value`
    pub fn splat(shape: TypeShape, value: f64) -> ConstantData {
        ConstantData {
            shape,
            elements: vec![value; shape.component_count()],
        }
    }

    /// All-zero constant of the given shape
    pub fn zero(shape: TypeShape) -> ConstantData {
        ConstantData::splat(shape, 0.0)
    }

    /// True when every element equals `value`
    pub fn is_splat_of(&self, value: f64) -> bool {
        self.elements.iter().all(|&e| e == value)
    }

    /// Canonical text: `5` for scalars, `float3(5,7,9)` for vectors,
    /// `float4x4(...)` for matrices.
    pub fn format(&self) -> String {
        let kind = self.shape.scalar();
        match self.shape {
            TypeShape::Scalar(_) => format_element(kind, self.elements[0]),
            _ => {
                let body: Vec<String> = self
                    .elements
                    .iter()
                    .map(|&e| format_element(kind, e))
                    .collect();
                format!("{}({})", self.shape, body.join(","))
            }
        }
    }
}

fn format_element(kind: ScalarKind, value: f64) -> String {
    if kind == ScalarKind::Bool {
        return if value == 0.0 { "false" } else { "true" }.to_string();
    }
    // `{}` on f64 never prints trailing zeroes (5 -> "5", 0.5 -> "0.5")
    format!("{value}")
}

fn parse_element(token: &str) -> Option<f64> {
    match token {
        "true" => Some(1.0),
        "false" => Some(0.0),
        _ => {
            let token = token.strip_suffix(['f', 'F', 'h', 'H']).unwrap_or(token);
            token.parse::<f64>().ok()
        }
    }
}

/// Parse a constant's literal text against its declared type descriptor.
///
/// Accepts bare scalar literals and constructor syntax
/// (`float3(1, 2, 3)`); a single element splats across the declared
/// component count (`float3(1)` is `(1,1,1)`). Returns `None` when the
/// type is not in the scalar/vector/matrix grammar or the text does not
/// parse to a matching element count.
pub fn parse_typed(text: &str, ty: &str) -> Option<ConstantData> {
    let shape = types::parse_shape(ty)?;
    let expected = shape.component_count();
    let text = text.trim();

    let elements: Vec<f64> = if let Some(open) = text.find('(') {
        let inner = text[open + 1..].strip_suffix(')')?;
        inner
            .split(',')
            .map(|tok| parse_element(tok.trim()))
            .collect::<Option<Vec<f64>>>()?
    } else {
        vec![parse_element(text)?]
    };

    if elements.len() == expected {
        Some(ConstantData { shape, elements })
    } else if elements.len() == 1 {
        Some(ConstantData::splat(shape, elements[0]))
    } else {
        None
    }
}
