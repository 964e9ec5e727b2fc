//! # Type Descriptor Grammar
//!
//! IR types travel as strings (`float`, `float3`, `float4x4`,
//! `Texture2D<float4>`, ...). This module parses the closed scalar /
//! vector / matrix grammar into [`TypeShape`] for type-rule checking and
//! formats shapes back into their canonical text.
//!
//! Resource types (textures, samplers, buffers, cbuffers, named structs)
//! do not parse as shapes; they are classified by [`is_resource_type`].

use std::fmt;

/// Scalar element kinds of the numeric/bool type grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Half,
    Double,
    Int,
    Uint,
    Bool,
}

impl ScalarKind {
    /// Canonical lower-case name (`float`, `half`, ...)
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Float => "float",
            ScalarKind::Half => "half",
            ScalarKind::Double => "double",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Bool => "bool",
        }
    }

    /// All kinds except `bool` participate in arithmetic type rules
    pub fn is_numeric(self) -> bool {
        !matches!(self, ScalarKind::Bool)
    }

    /// Whether elements are stored as whole numbers
    pub fn is_integral(self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::Uint | ScalarKind::Bool)
    }

    fn parse(name: &str) -> Option<ScalarKind> {
        match name {
            "float" => Some(ScalarKind::Float),
            "half" => Some(ScalarKind::Half),
            "double" => Some(ScalarKind::Double),
            "int" => Some(ScalarKind::Int),
            "uint" => Some(ScalarKind::Uint),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed form of a scalar/vector/matrix type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// A single scalar element
    Scalar(ScalarKind),
    /// `<scalar><n>` with n in 2..=4
    Vector(ScalarKind, u8),
    /// `<scalar><r>x<c>`
    Matrix(ScalarKind, u8, u8),
}

impl TypeShape {
    /// Scalar base of the shape
    pub fn scalar(self) -> ScalarKind {
        match self {
            TypeShape::Scalar(s) | TypeShape::Vector(s, _) | TypeShape::Matrix(s, _, _) => s,
        }
    }

    /// Total element count (matrices count rows * columns)
    pub fn component_count(self) -> usize {
        match self {
            TypeShape::Scalar(_) => 1,
            TypeShape::Vector(_, n) => n as usize,
            TypeShape::Matrix(_, r, c) => r as usize * c as usize,
        }
    }

    /// Shape with the same scalar base and `n` components.
    ///
    /// Used by component-level DCE when a swizzle result narrows. `n = 1`
    /// collapses to the scalar type; matrices never narrow.
    pub fn with_component_count(self, n: usize) -> TypeShape {
        let scalar = self.scalar();
        match n {
            1 => TypeShape::Scalar(scalar),
            2..=4 => TypeShape::Vector(scalar, n as u8),
            _ => self,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Scalar(s) => write!(f, "{s}"),
            TypeShape::Vector(s, n) => write!(f, "{s}{n}"),
            TypeShape::Matrix(s, r, c) => write!(f, "{s}{r}x{c}"),
        }
    }
}

/// Parse a type descriptor into a [`TypeShape`].
///
/// Returns `None` for resource types, named structs, `unknown`, and
/// anything else outside the scalar/vector/matrix grammar.
pub fn parse_shape(ty: &str) -> Option<TypeShape> {
    for scalar in [
        ScalarKind::Float,
        ScalarKind::Half,
        ScalarKind::Double,
        ScalarKind::Int,
        ScalarKind::Uint,
        ScalarKind::Bool,
    ] {
        let name = scalar.name();
        if ty == name {
            return Some(TypeShape::Scalar(scalar));
        }
        if let Some(rest) = ty.strip_prefix(name) {
            if let Some(shape) = parse_suffix(scalar, rest) {
                return Some(shape);
            }
        }
    }
    None
}

fn parse_suffix(scalar: ScalarKind, rest: &str) -> Option<TypeShape> {
    let bytes = rest.as_bytes();
    match bytes {
        [n @ b'2'..=b'4'] => Some(TypeShape::Vector(scalar, n - b'0')),
        [r @ b'1'..=b'4', b'x', c @ b'1'..=b'4'] => {
            Some(TypeShape::Matrix(scalar, r - b'0', c - b'0'))
        }
        _ => None,
    }
}

/// Whether a type descriptor names an opaque resource.
///
/// Store targets with resource types are exempt from scalar-match rules
/// because their element type is opaque at this level.
pub fn is_resource_type(ty: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "Texture",
        "RWTexture",
        "SamplerState",
        "SamplerComparisonState",
        "StructuredBuffer",
        "RWStructuredBuffer",
        "Buffer",
        "RWBuffer",
        "cbuffer",
    ];
    PREFIXES.iter().any(|p| ty.starts_with(p))
}
