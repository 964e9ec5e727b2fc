//! End-to-end pipeline tests: lower, optimize, validate, and the JSON
//! boundaries.

use openfxc_ir::ir::builders::{FunctionBuilder, ModuleBuilder};
use openfxc_ir::ir::{Op, Severity, Stage, ValueKind};
use openfxc_ir::{lower, optimize, pipeline, IrModule, LowerRequest, OptimizeOptions};
use serde_json::json;

fn error_count(module: &IrModule) -> usize {
    module
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count()
}

/// Scenario: a minimal passthrough module survives the default pass
/// sequence untouched except for appended Info diagnostics.
#[test]
fn minimal_return_is_a_fixed_point_of_default_passes() {
    let mut builder = ModuleBuilder::new("ps_2_0");
    let v1 = builder.value(ValueKind::Parameter, "float4").named("v1").id();
    let main = FunctionBuilder::new("main", "float4")
        .parameter(v1)
        .block("entry", |b| {
            b.ret(Some(v1));
        })
        .build();
    let module = builder.function(main).build();
    assert_eq!(error_count(&module), 0);

    let optimized = optimize(module.clone(), &OptimizeOptions::default());
    assert_eq!(error_count(&optimized), 0);
    assert_eq!(optimized.functions, module.functions);
    assert_eq!(optimized.values, module.values);

    let infos = optimized
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Info)
        .count();
    assert_eq!(infos, 6, "one Info notice per default pass");
}

#[test]
fn unknown_pass_reports_error_and_runs_the_rest() {
    let mut builder = ModuleBuilder::new("ps_2_0");
    let v1 = builder.constant("float", "2");
    let v2 = builder.constant("float", "3");
    let v3 = builder.value(ValueKind::Temp, "float").id();
    let main = FunctionBuilder::new("main", "float")
        .block("entry", |b| {
            b.binary(Op::Add, v1, v2, v3, "float");
            b.ret(Some(v3));
        })
        .build();
    let module = optimize(
        builder.function(main).build(),
        &OptimizeOptions {
            passes: Some("constfold,loop-unroll".to_string()),
            profile: None,
        },
    );

    let unknown: Vec<_> = module
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error && d.stage == Stage::Optimize)
        .collect();
    assert_eq!(unknown.len(), 1);
    assert!(unknown[0].message.contains("loop-unroll"));

    // constfold still ran
    assert!(module
        .values
        .iter()
        .any(|v| v.name.as_deref() == Some("5")));
}

#[test]
fn profile_override_applies_before_passes() {
    let module = ModuleBuilder::new("ps_2_0").build();
    let optimized = optimize(
        module,
        &OptimizeOptions {
            passes: Some(String::new()),
            profile: Some("ps_3_0".to_string()),
        },
    );
    assert_eq!(optimized.profile, "ps_3_0");
}

#[test]
fn diagnostics_accumulate_in_stage_order() {
    let mut builder = ModuleBuilder::new("ps_2_0");
    let v1 = builder.value(ValueKind::Parameter, "float4").id();
    let main = FunctionBuilder::new("main", "float4")
        .parameter(v1)
        .block("entry", |b| {
            b.ret(Some(v1));
        })
        .build();
    let mut module = builder.function(main).build();
    module
        .diagnostics
        .push(openfxc_ir::Diagnostic::info(Stage::Lower, "lowered"));

    let optimized = optimize(module, &OptimizeOptions::default());
    // The pre-existing lowering diagnostic is still first
    assert_eq!(optimized.diagnostics[0].stage, Stage::Lower);
    assert!(optimized.diagnostics.len() > 1);
}

/// Lower a small but complete shader and push it through the default
/// passes; the reference pipeline must come out Error-free.
#[test]
fn lower_then_optimize_is_error_free_on_reference_input() {
    let doc = json!({
        "profile": "ps_2_0",
        "entryPoints": [{"name": "main", "stage": "Pixel", "symbolId": 1}],
        "symbols": [
            {"id": 1, "kind": "Function", "name": "main", "type": "float4", "declNodeId": 100},
            {"id": 2, "kind": "Parameter", "name": "color", "type": "float4",
             "parentSymbolId": 1, "semantic": {"name": "COLOR", "index": 0}}
        ],
        "types": [
            {"nodeId": 103, "type": "float4"},
            {"nodeId": 104, "type": "float4"},
            {"nodeId": 105, "type": "float"},
            {"nodeId": 106, "type": "float4"}
        ],
        "syntax": {"nodes": [
            {"id": 100, "kind": "FunctionDeclaration", "children": [{"role": "body", "nodeId": 101}]},
            {"id": 101, "kind": "BlockStatement", "children": [{"role": "statement", "nodeId": 102}]},
            {"id": 102, "kind": "ReturnStatement", "children": [{"role": "expression", "nodeId": 103}]},
            {"id": 103, "kind": "BinaryExpression", "operator": "*", "children": [
                {"role": "left", "nodeId": 104}, {"role": "right", "nodeId": 106}
            ]},
            {"id": 104, "kind": "Identifier", "referencedSymbolId": 2},
            {"id": 105, "kind": "LiteralExpression", "literal": "1"},
            {"id": 106, "kind": "CastExpression", "children": [{"role": "operand", "nodeId": 105}]}
        ]}
    });
    let request = LowerRequest {
        semantic: serde_json::from_value(doc).expect("fixture"),
        profile: None,
        entry: None,
    };
    let lowered = lower(&request);
    assert_eq!(error_count(&lowered), 0, "diagnostics: {:?}", lowered.diagnostics);

    let optimized = optimize(lowered, &OptimizeOptions::default());
    assert_eq!(error_count(&optimized), 0, "diagnostics: {:?}", optimized.diagnostics);
    assert_eq!(optimized.format_version, 1);
}

#[test]
fn module_survives_write_then_read() {
    let mut builder = ModuleBuilder::new("ps_2_0");
    let v1 = builder.value(ValueKind::Parameter, "float4").id();
    let main = FunctionBuilder::new("main", "float4")
        .parameter(v1)
        .block("entry", |b| {
            b.ret(Some(v1));
        })
        .build();
    let module = builder.function(main).build();

    let mut buffer = Vec::new();
    pipeline::write_module(&module, &mut buffer).expect("write");
    let reread = pipeline::read_module(buffer.as_slice()).expect("read");
    assert_eq!(module, reread);
}

#[test]
fn optimize_accepts_previously_written_modules_from_disk() {
    use std::io::Write;

    let mut builder = ModuleBuilder::new("ps_2_0");
    let v1 = builder.constant("float", "4");
    let v2 = builder.constant("float", "5");
    let v3 = builder.value(ValueKind::Temp, "float").id();
    let main = FunctionBuilder::new("main", "float")
        .block("entry", |b| {
            b.binary(Op::Mul, v1, v2, v3, "float");
            b.ret(Some(v3));
        })
        .build();
    let module = builder.function(main).build();

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    let mut serialized = Vec::new();
    pipeline::write_module(&module, &mut serialized).expect("write");
    file.write_all(&serialized).expect("write file");

    let reread = pipeline::read_module(std::fs::File::open(file.path()).expect("open"))
        .expect("read");
    let optimized = optimize(reread, &OptimizeOptions::default());
    assert_eq!(error_count(&optimized), 0);
    assert!(optimized
        .values
        .iter()
        .any(|v| v.name.as_deref() == Some("20")));
}

#[test]
fn malformed_input_is_a_parse_error() {
    let result = pipeline::read_module("not json at all".as_bytes());
    assert!(matches!(
        result,
        Err(openfxc_ir::PipelineError::Parse(_))
    ));
}

#[test]
fn lowering_a_hollow_document_still_returns_a_module() {
    let request = LowerRequest {
        semantic: serde_json::from_value(json!({})).expect("empty doc"),
        profile: None,
        entry: None,
    };
    let module = lower(&request);
    assert_eq!(module.profile, "unknown");
    assert!(module.functions.is_empty());
    assert!(error_count(&module) >= 1, "missing entry should be reported");
}
