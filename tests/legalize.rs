//! End-to-end legalization of small `mhlo` programs.

mod common;

use common::{Program, conv_dimension_numbers, mhlo_enum, precision_config};
use hlo_ir::dialect::func;
use hlo_ir::rewrite::IllegalOp;
use hlo_ir::{Attribute, DialectAttr, DialectAttrData, Symbol, SymbolTable};
use hlo_legalize::{
    LegalizeError, LegalizeOptions, legalize_to_stablehlo, legalize_to_stablehlo_partial,
};
use insta::assert_snapshot;

fn experimental() -> LegalizeOptions {
    LegalizeOptions::new().allow_experimental_features(true)
}

#[test]
fn tan_becomes_versioned_custom_call() {
    let mut p = Program::new(1);
    let a = p.args[0];
    let tan = p.mhlo("tan", &[a], vec![]);
    let result = p.ctx.op_result(tan, 0);
    p.ret(&[result]);

    legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    assert_snapshot!(p.print(), @r#"
    core.module @test {
      func.func @main(%0: builtin.tensor(builtin.f32)) {
        %1 = stablehlo.custom_call %0 {call_target_name = "mhlo.tan", mhlo.attributes = {}, mhlo.version = 1} : builtin.tensor(builtin.f32)
        func.return %1
      }
    }
    "#);
}

#[test]
fn single_operand_all_reduce_is_translated_directly() {
    let mut p = Program::new(1);
    let a = p.args[0];
    let reducer = p.reducer();
    let all_reduce = p.mhlo_with_regions("all_reduce", &[a], vec![], vec![reducer]);
    let result = p.ctx.op_result(all_reduce, 0);
    p.ret(&[result]);

    legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    assert_snapshot!(p.print(), @r"
    core.module @test {
      func.func @main(%0: builtin.tensor(builtin.f32)) {
        %1 = stablehlo.all_reduce %0 : builtin.tensor(builtin.f32) {
          ^bb1(%2: builtin.tensor(builtin.f32), %3: builtin.tensor(builtin.f32)):
            %4 = stablehlo.add %2, %3 : builtin.tensor(builtin.f32)
            stablehlo.return %4
        }
        func.return %1
      }
    }
    ");
    assert_eq!(p.functions().len(), 1);
}

#[test]
fn tuple_all_reduce_needs_experimental_features() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let reducer = p.reducer();
    let all_reduce = p.mhlo_with_regions("all_reduce", &[a, b], vec![], vec![reducer]);
    let result = p.ctx.op_result(all_reduce, 0);
    p.ret(&[result]);

    let err = legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap_err();
    let LegalizeError::IllegalOps(illegal) = &err;
    assert_eq!(illegal.len(), 1);
    assert_eq!(illegal[0].op, all_reduce);
    assert!(err.to_string().starts_with("failed to legalize 1 op(s): mhlo.all_reduce"));
    assert_eq!(p.functions().len(), 1);

    legalize_to_stablehlo(&mut p.ctx, p.module, &experimental()).unwrap();
    let call = p.main_ops()[0];
    assert!(p.ctx.op_is(call, "stablehlo", "custom_call"));
    assert_eq!(
        p.attr(call, "called_computations"),
        Some(&Attribute::List(vec![Attribute::SymbolRef(Symbol::new("all_reduce"))]))
    );
    assert_eq!(p.attr(call, "mhlo.version"), None);
    assert!(p.ctx.op(call).regions.is_empty());

    let table = SymbolTable::new(&p.ctx, p.module);
    let reducer_fn = table.lookup(&p.ctx, Symbol::new("all_reduce")).unwrap();
    assert_eq!(
        func::signature(&p.ctx, reducer_fn),
        Some((vec![p.tensor, p.tensor], vec![p.tensor]))
    );
    let body = func::body(&p.ctx, reducer_fn).unwrap();
    let block = p.ctx.region(body).blocks[0];
    let ops = p.ctx.block(block).ops.to_vec();
    assert!(p.ctx.op_is(ops[0], "stablehlo", "add"));
    assert!(p.ctx.op_is(ops[1], "stablehlo", "return"));
}

#[test]
fn capturing_region_blocks_the_conversion() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let reducer = p.capturing_reducer(b);
    let all_reduce = p.mhlo_with_regions("all_reduce", &[a, b], vec![], vec![reducer]);
    let result = p.ctx.op_result(all_reduce, 0);
    p.ret(&[result]);

    let err = legalize_to_stablehlo(&mut p.ctx, p.module, &experimental()).unwrap_err();
    let LegalizeError::IllegalOps(illegal) = err;
    assert_eq!(illegal.len(), 1);
    assert_eq!(illegal[0].op, all_reduce);

    assert!(p.ctx.op_is(p.main_ops()[0], "mhlo", "all_reduce"));
    assert_eq!(p.ctx.op(all_reduce).regions.as_slice(), &[reducer]);
    assert_eq!(p.functions().len(), 1);
    assert!(!SymbolTable::new(&p.ctx, p.module).contains(Symbol::new("all_reduce")));
}

#[test]
fn typed_ffi_custom_call_is_encoded() {
    let mut p = Program::new(1);
    let a = p.args[0];
    p.mhlo(
        "custom_call",
        &[a],
        vec![
            ("api_version", Attribute::from(4i64)),
            ("backend_config", Attribute::from("{}")),
            ("call_target_name", Attribute::from("my_kernel")),
        ],
    );

    legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    let call = p.main_ops()[0];
    assert_eq!(p.attr(call, "call_target_name"), Some(&Attribute::from("mhlo.custom_call")));
    assert_eq!(p.attr(call, "mhlo.version"), Some(&Attribute::from(1i64)));
    let Some(Attribute::Dict(encoded)) = p.attr(call, "mhlo.attributes") else {
        panic!("missing mhlo.attributes");
    };
    assert_eq!(encoded.len(), 3);
    assert_eq!(encoded.get(&Symbol::new("api_version")), Some(&Attribute::from(4i64)));
    assert_eq!(
        encoded.get(&Symbol::new("call_target_name")),
        Some(&Attribute::from("my_kernel"))
    );
}

#[test]
fn default_schedule_is_dropped_from_direct_custom_calls() {
    let mut p = Program::new(1);
    let a = p.args[0];
    p.mhlo(
        "custom_call",
        &[a],
        vec![
            ("call_target_name", Attribute::from("my_kernel")),
            ("custom_call_schedule", mhlo_enum("custom_call_schedule", "NONE")),
        ],
    );

    legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    let call = p.main_ops()[0];
    let keys: Vec<_> = p.ctx.op(call).attributes.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, ["call_target_name"]);
    assert_eq!(p.attr(call, "call_target_name"), Some(&Attribute::from("my_kernel")));
}

#[test]
fn scheduled_custom_calls_stay_private() {
    let mut p = Program::new(1);
    let a = p.args[0];
    let call = p.mhlo(
        "custom_call",
        &[a],
        vec![
            ("api_version", Attribute::from(4i64)),
            ("call_target_name", Attribute::from("my_kernel")),
            ("custom_call_schedule", mhlo_enum("custom_call_schedule", "LATEST")),
        ],
    );

    let result = legalize_to_stablehlo_partial(&mut p.ctx, p.module, &experimental());
    assert!(result.reached_fixpoint);
    assert_eq!(result.total_changes, 0);
    assert_eq!(p.main_ops(), [call]);
}

#[test]
fn private_marker_wins_over_experimental_one() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let conv = p.mhlo(
        "convolution",
        &[a, b],
        vec![
            ("dimension_numbers", conv_dimension_numbers(true)),
            ("precision_config", precision_config(&["PACKED_NIBBLE", "DEFAULT"])),
        ],
    );

    legalize_to_stablehlo_partial(&mut p.ctx, p.module, &experimental());
    assert!(p.ctx.op_is(conv, "mhlo", "convolution"));
    assert_eq!(p.main_ops(), [conv]);
}

#[test]
fn packed_nibble_routes_through_the_fallback() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let conv = p.mhlo(
        "convolution",
        &[a, b],
        vec![
            ("dimension_numbers", conv_dimension_numbers(false)),
            ("precision_config", precision_config(&["PACKED_NIBBLE", "HIGHEST"])),
        ],
    );

    legalize_to_stablehlo_partial(&mut p.ctx, p.module, &LegalizeOptions::default());
    assert_eq!(p.main_ops(), [conv]);

    legalize_to_stablehlo(&mut p.ctx, p.module, &experimental()).unwrap();
    let call = p.main_ops()[0];
    assert_eq!(p.attr(call, "call_target_name"), Some(&Attribute::from("mhlo.convolution")));
    let Some(Attribute::Dict(encoded)) = p.attr(call, "mhlo.attributes") else {
        panic!("missing mhlo.attributes");
    };
    assert_eq!(
        encoded.get(&Symbol::new("precision_config")),
        Some(&Attribute::List(vec![
            Attribute::from("PACKED_NIBBLE"),
            Attribute::from("HIGHEST"),
        ]))
    );
}

#[test]
fn ordinary_precision_is_translated_directly() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    p.mhlo(
        "dot",
        &[a, b],
        vec![("precision_config", precision_config(&["HIGH", "DEFAULT"]))],
    );

    legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    let dot = p.main_ops()[0];
    assert!(p.ctx.op_is(dot, "stablehlo", "dot"));
    assert_snapshot!(
        hlo_ir::printer::print_op(&p.ctx, dot),
        @"%0 = stablehlo.dot %?, %? {precision_config = [#stablehlo<precision HIGH>, #stablehlo<precision DEFAULT>]} : builtin.tensor(builtin.f32)"
    );
}

#[test]
fn frontend_attributes_are_carried_over_verbatim() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let sharding = Attribute::Dialect(DialectAttr::new(
        Symbol::new("mhlo"),
        DialectAttrData::Opaque {
            kind: Symbol::new("sharding"),
            body: "{replicated}".to_owned(),
        },
    ));
    let frontend = Attribute::Dict(
        [
            (Symbol::new("sharding"), sharding),
            (Symbol::new("p"), mhlo_enum("precision", "HIGH")),
        ]
        .into_iter()
        .collect(),
    );
    p.mhlo("add", &[a, b], vec![("mhlo.frontend_attributes", frontend.clone())]);

    let result =
        legalize_to_stablehlo_partial(&mut p.ctx, p.module, &LegalizeOptions::default());
    assert_eq!(result.total_changes, 1);
    let add = p.main_ops()[0];
    assert!(p.ctx.op_is(add, "stablehlo", "add"));
    assert_eq!(p.attr(add, "mhlo.frontend_attributes"), Some(&frontend));
}

#[test]
fn direct_translation_keeps_the_shape_and_is_stable() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let cmp = p.mhlo(
        "compare",
        &[b, a],
        vec![("comparison_direction", mhlo_enum("comparison_direction", "GE"))],
    );
    let result = p.ctx.op_result(cmp, 0);
    p.ret(&[result]);

    let first = legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    assert_eq!(first.total_changes, 1);
    let new = p.main_ops()[0];
    assert!(p.ctx.op_is(new, "stablehlo", "compare"));
    assert_eq!(p.ctx.op_operands(new), &[b, a]);
    assert_eq!(p.ctx.op_result_types(new), &[p.tensor]);

    let before = p.print();
    let second = legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap();
    assert_eq!(second.total_changes, 0);
    assert_eq!(p.print(), before);
}

#[test]
fn unknown_enum_values_leave_the_op_behind() {
    let mut p = Program::new(2);
    let (a, b) = (p.args[0], p.args[1]);
    let cmp = p.mhlo(
        "compare",
        &[a, b],
        vec![("comparison_direction", mhlo_enum("comparison_direction", "SIDEWAYS"))],
    );

    let err = legalize_to_stablehlo(&mut p.ctx, p.module, &LegalizeOptions::default()).unwrap_err();
    assert_eq!(
        err,
        LegalizeError::IllegalOps(vec![IllegalOp {
            op: cmp,
            dialect: Symbol::new("mhlo"),
            name: Symbol::new("compare"),
        }])
    );
}
