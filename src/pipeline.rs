//! # Pipeline Orchestration
//!
//! Top-level entry points joining the lowering pipeline, the
//! optimization passes, and the invariant validator:
//!
//! ```text
//! semantic document -> lower() ---> IrModule + diagnostics
//! IrModule          -> optimize() -> IrModule + diagnostics
//! ```
//!
//! Both pipelines append the validator's findings to the module before
//! returning. Diagnostics are never removed. Neither pipeline fails for
//! invalid IR content; only unreadable input aborts, through the reader
//! helpers' [`PipelineError`].

use crate::error::PipelineError;
use crate::ir::IrModule;
use crate::lowering::{lower_semantic, LowerRequest};
use crate::optimizer;
use crate::semantic::SemanticModel;
use crate::validator;
use std::io::{Read, Write};

/// Options of one optimize run
#[derive(Debug, Clone, Default)]
pub struct OptimizeOptions {
    /// Comma-separated pass list; `None` runs the default sequence
    pub passes: Option<String>,
    /// Replaces the module's profile before passes run
    pub profile: Option<String>,
}

/// Lower a semantic model and validate the result.
pub fn lower(request: &LowerRequest) -> IrModule {
    let mut module = lower_semantic(request);
    let findings = validator::validate(&module);
    module.diagnostics.extend(findings);
    tracing::info!(
        functions = module.functions.len(),
        diagnostics = module.diagnostics.len(),
        "lowering finished"
    );
    module
}

/// Run an optimization pass sequence and validate the result.
pub fn optimize(mut module: IrModule, options: &OptimizeOptions) -> IrModule {
    if let Some(profile) = &options.profile {
        module.profile = profile.clone();
    }
    let passes = match options.passes.as_deref() {
        Some(spec) => {
            let (passes, diagnostics) = optimizer::parse_pass_list(spec);
            module.diagnostics.extend(diagnostics);
            passes
        }
        None => optimizer::default_passes(),
    };

    let mut module = optimizer::run_passes(module, &passes);
    let findings = validator::validate(&module);
    module.diagnostics.extend(findings);
    tracing::info!(
        passes = passes.len(),
        diagnostics = module.diagnostics.len(),
        "optimization finished"
    );
    module
}

/// Read a semantic-model document from JSON.
pub fn read_semantic(reader: impl Read) -> Result<SemanticModel, PipelineError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read an IR module from JSON.
pub fn read_module(reader: impl Read) -> Result<IrModule, PipelineError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write an IR module as pretty-printed JSON.
pub fn write_module(module: &IrModule, mut writer: impl Write) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(&mut writer, module)?;
    writeln!(writer)?;
    Ok(())
}
