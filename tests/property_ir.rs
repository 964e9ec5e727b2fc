//! Property-based tests (proptest) for constant handling and pass
//! invariant preservation.

use openfxc_ir::ir::builders::{FunctionBuilder, ModuleBuilder};
use openfxc_ir::ir::constant::{self, ConstantData};
use openfxc_ir::ir::{types, Op, Severity, ValueKind};
use openfxc_ir::{optimize, validate, IrModule, OptimizeOptions};
use proptest::prelude::*;

fn finite_scalar() -> impl Strategy<Value = f64> {
    // Large magnitudes only make the canonical text longer; the
    // interesting behavior is all within this range.
    -1.0e12..1.0e12_f64
}

fn assert_error_free(module: &IrModule) {
    let errors: Vec<_> = validate(module)
        .into_iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "validator errors: {errors:?}");
}

proptest! {
    #[test]
    fn scalar_constant_text_round_trips(x in finite_scalar()) {
        let shape = types::parse_shape("float").unwrap();
        let original = ConstantData { shape, elements: vec![x] };
        let text = original.format();
        let reread = constant::parse_typed(&text, "float").expect("canonical text parses");
        prop_assert_eq!(reread.elements, vec![x]);
    }

    #[test]
    fn vector_constant_text_round_trips(elements in prop::collection::vec(finite_scalar(), 2..=4)) {
        let ty = format!("float{}", elements.len());
        let shape = types::parse_shape(&ty).unwrap();
        let original = ConstantData { shape, elements: elements.clone() };
        let text = original.format();
        let reread = constant::parse_typed(&text, &ty).expect("canonical text parses");
        prop_assert_eq!(reread.elements, elements);
    }

    #[test]
    fn constfold_matches_host_arithmetic(a in finite_scalar(), b in finite_scalar()) {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let va = builder.constant("float", format!("{a}"));
        let vb = builder.constant("float", format!("{b}"));
        let r = builder.value(ValueKind::Temp, "float").id();
        let main = FunctionBuilder::new("main", "float")
            .block("entry", |blk| {
                blk.binary(Op::Add, va, vb, r, "float");
                blk.ret(Some(r));
            })
            .build();
        let module = optimize(
            builder.function(main).build(),
            &OptimizeOptions { passes: Some("constfold".to_string()), profile: None },
        );

        let folded = module
            .values
            .iter()
            .find(|v| v.kind == ValueKind::Constant && v.id > 2)
            .expect("fold introduces a constant");
        let expected = ConstantData {
            shape: types::parse_shape("float").unwrap(),
            elements: vec![a + b],
        };
        let expected_name = expected.format();
        prop_assert_eq!(folded.name.as_deref(), Some(expected_name.as_str()));
    }

    #[test]
    fn default_passes_preserve_invariants_on_add_chains(
        constants in prop::collection::vec(finite_scalar(), 1..8)
    ) {
        let mut builder = ModuleBuilder::new("ps_2_0");
        let mut previous = builder.value(ValueKind::Parameter, "float").id();
        let parameter = previous;
        let mut temps = Vec::new();
        for value in &constants {
            let c = builder.constant("float", format!("{value}"));
            let t = builder.value(ValueKind::Temp, "float").id();
            temps.push((previous, c, t));
            previous = t;
        }
        let last = previous;
        let main = FunctionBuilder::new("main", "float")
            .parameter(parameter)
            .block("entry", move |blk| {
                for (lhs, rhs, result) in temps {
                    blk.binary(Op::Add, lhs, rhs, result, "float");
                }
                blk.ret(Some(last));
            })
            .build();

        let module = builder.function(main).build();
        assert_error_free(&module);
        let optimized = optimize(module, &OptimizeOptions::default());
        assert_error_free(&optimized);

        // The chain still ends in a single well-formed Return
        let block = &optimized.functions[0].blocks[0];
        prop_assert!(block.instructions.last().unwrap().terminator);
    }

    #[test]
    fn algebraic_never_changes_declared_types(n in 2..=4usize) {
        let ty = format!("float{n}");
        let mut builder = ModuleBuilder::new("ps_2_0");
        let p = builder.value(ValueKind::Parameter, ty.clone()).id();
        let zero = builder.constant(ty.clone(), format!("{ty}(0)"));
        let r = builder.value(ValueKind::Temp, ty.clone()).id();
        let main = FunctionBuilder::new("main", ty.clone())
            .parameter(p)
            .block("entry", |blk| {
                blk.binary(Op::Add, p, zero, r, ty.clone());
                blk.ret(Some(r));
            })
            .build();
        let module = optimize(
            builder.function(main).build(),
            &OptimizeOptions { passes: Some("algebraic".to_string()), profile: None },
        );

        let instruction = &module.functions[0].blocks[0].instructions[0];
        prop_assert_eq!(&instruction.op, &Op::Assign);
        prop_assert_eq!(instruction.operands.clone(), vec![p]);
        prop_assert_eq!(instruction.ty.as_deref(), Some(module.value(r).unwrap().ty.as_str()));
        assert_error_free(&module);
    }
}
