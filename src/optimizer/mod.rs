//! # IR Optimizer
//!
//! Classical passes over IR modules, run in a configurable sequence:
//!
//! - `constfold`: fold pure all-constant instructions
//! - `algebraic`: `x+0`, `x*1`, `x*0` identities
//! - `copyprop`: branching-aware copy propagation
//! - `cse`: per-block common-subexpression elimination
//! - `dce`: delete pure instructions with unused results
//! - `component-dce`: lane-level liveness and swizzle narrowing
//!
//! ```text
//! IrModule -> [pass, pass, ...] -> IrModule -> Invariant Validator
//! ```
//!
//! Passes are functional module transformations: side effects, types,
//! SSA form, and the CFG are preserved; each pass leaves an Info
//! diagnostic recording that it executed.

use crate::ir::{Diagnostic, IrModule, Stage};

pub mod algebraic;
pub mod cfg;
pub mod component_dce;
pub mod constfold;
pub mod copyprop;
pub mod cse;
pub mod dce;

/// Recognized pass names, in default execution order
pub const PASS_NAMES: &[&str] = &[
    "constfold",
    "algebraic",
    "copyprop",
    "cse",
    "dce",
    "component-dce",
];

/// One optimization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ConstFold,
    Algebraic,
    CopyProp,
    Cse,
    Dce,
    ComponentDce,
}

impl Pass {
    /// The name used in pass lists and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Pass::ConstFold => "constfold",
            Pass::Algebraic => "algebraic",
            Pass::CopyProp => "copyprop",
            Pass::Cse => "cse",
            Pass::Dce => "dce",
            Pass::ComponentDce => "component-dce",
        }
    }

    /// Parse a lowercase pass token
    pub fn parse(token: &str) -> Option<Pass> {
        match token {
            "constfold" => Some(Pass::ConstFold),
            "algebraic" => Some(Pass::Algebraic),
            "copyprop" => Some(Pass::CopyProp),
            "cse" => Some(Pass::Cse),
            "dce" => Some(Pass::Dce),
            "component-dce" => Some(Pass::ComponentDce),
            _ => None,
        }
    }

    fn run(self, module: IrModule) -> IrModule {
        match self {
            Pass::ConstFold => constfold::run(module),
            Pass::Algebraic => algebraic::run(module),
            Pass::CopyProp => copyprop::run(module),
            Pass::Cse => cse::run(module),
            Pass::Dce => dce::run(module),
            Pass::ComponentDce => component_dce::run(module),
        }
    }
}

/// The default sequence when no pass list is given
pub fn default_passes() -> Vec<Pass> {
    vec![
        Pass::ConstFold,
        Pass::Algebraic,
        Pass::CopyProp,
        Pass::Cse,
        Pass::Dce,
        Pass::ComponentDce,
    ]
}

/// Parse a comma-separated pass list. Unknown tokens yield an Error
/// diagnostic naming the valid passes and are skipped.
pub fn parse_pass_list(spec: &str) -> (Vec<Pass>, Vec<Diagnostic>) {
    let mut passes = Vec::new();
    let mut diagnostics = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match Pass::parse(token) {
            Some(pass) => passes.push(pass),
            None => diagnostics.push(Diagnostic::error(
                Stage::Optimize,
                format!(
                    "unknown pass '{token}'; valid passes are: {}",
                    PASS_NAMES.join(", ")
                ),
            )),
        }
    }
    (passes, diagnostics)
}

/// Run a pass sequence over a module, appending one Info diagnostic per
/// executed pass.
pub fn run_passes(mut module: IrModule, passes: &[Pass]) -> IrModule {
    for pass in passes {
        tracing::debug!(pass = pass.name(), "running optimization pass");
        module = pass.run(module);
        module.diagnostics.push(Diagnostic::info(
            Stage::Optimize,
            format!("pass '{}' executed", pass.name()),
        ));
    }
    module
}
