//! # OpenFXC IR
//!
//! Middle-end of a shader compiler toolchain: consumes the semantic
//! model produced by an upstream HLSL front-end and produces a
//! backend-agnostic, SSA-ish, typed intermediate representation, then
//! optimizes it with classical passes.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Semantic Model (front-end JSON)
//!     ↓
//! [Lowering]              → IrModule (values, blocks, resources, techniques)
//!     ↓
//! [Invariant Validator]   → diagnostics appended
//!     ↓
//! [Optimizer]             → constfold, algebraic, copyprop, cse, dce,
//!     ↓                     component-dce (configurable sequence)
//! [Invariant Validator]   → diagnostics appended
//!     ↓
//! IR Module (backend-agnostic JSON, formatVersion 1)
//! ```
//!
//! Downstream profile back-ends (register allocation, opcode selection,
//! container emission) are consumers of this IR and live elsewhere; the
//! validator actively rejects their vocabulary (`dxbc`, `dxil`,
//! `spirv`, `d3d`, `glsl`, `metal`) anywhere in a module.
//!
//! ## Usage
//!
//! ```rust
//! use openfxc_ir::{lower, optimize, LowerRequest, OptimizeOptions};
//!
//! let request = LowerRequest {
//!     semantic: serde_json::from_str(r#"{"profile": "ps_2_0"}"#).unwrap(),
//!     profile: None,
//!     entry: None,
//! };
//! let module = lower(&request);
//! let optimized = optimize(module, &OptimizeOptions::default());
//!
//! // Errors are data: inspect the diagnostics, the pipeline never throws
//! for diagnostic in &optimized.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `ir` | IR data model, type grammar, constants, builders |
//! | `semantic` | semantic-model document types |
//! | `lowering` | semantic model → IR |
//! | `optimizer` | IR → IR passes plus CFG helpers |
//! | `validator` | structural/type invariants, back-end leak scan |
//! | `pipeline` | orchestration and JSON I/O boundaries |

pub mod error;
pub mod ir;
pub mod lowering;
pub mod optimizer;
pub mod pipeline;
pub mod semantic;
pub mod validator;

pub use crate::error::PipelineError;
pub use crate::ir::{Diagnostic, IrModule, Severity, Stage};
pub use crate::lowering::LowerRequest;
pub use crate::pipeline::{lower, optimize, OptimizeOptions};
pub use crate::validator::validate;
