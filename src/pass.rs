//! Legalization passes.
//!
//! A single pattern visits every op: it classifies the op, then either
//! rejects it, encodes it as a custom call, or rebuilds it under
//! `stablehlo` through the catalog. The pattern applicator drives it to a
//! fixpoint; functions outlined from regions are appended to the module and
//! picked up by the next iteration.

use hlo_ir::rewrite::{
    ApplyResult, ConversionTarget, PatternApplicator, PatternRewriter, RewritePattern,
};
use hlo_ir::{IrContext, Module, OpRef};
use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::decode::DecodeFallbackPattern;
use crate::direct::translate_direct;
use crate::error::LegalizeError;
use crate::fallback::encode_fallback;
use crate::options::LegalizeOptions;
use crate::tier::{FeatureTier, classify};
use crate::types::{hlo_type_converter, reverse_type_converter};

/// Each iteration outlines at most one level of nested regions, so deep
/// region nesting needs more rounds than a flat program.
const MAX_ITERATIONS: usize = 32;

/// Legalize every `mhlo` op in `module` into `stablehlo`.
///
/// Fails, listing every op left behind, if some `mhlo` op has no legal form
/// under `options`. Ops converted before the failure stay converted.
pub fn legalize_to_stablehlo(
    ctx: &mut IrContext,
    module: Module,
    options: &LegalizeOptions,
) -> Result<ApplyResult, LegalizeError> {
    let applicator = legalize_applicator(options);
    let result = applicator
        .apply(ctx, module, &legalize_target())
        .map_err(LegalizeError::IllegalOps)?;
    debug!(
        iterations = result.iterations,
        changes = result.total_changes,
        "legalized module to stablehlo"
    );
    Ok(result)
}

/// Like [`legalize_to_stablehlo`], but ops without a legal form stay in place.
pub fn legalize_to_stablehlo_partial(
    ctx: &mut IrContext,
    module: Module,
    options: &LegalizeOptions,
) -> ApplyResult {
    let result = legalize_applicator(options).apply_partial(ctx, module);
    if !result.reached_fixpoint {
        warn!(
            iterations = result.iterations,
            "legalization stopped before reaching a fixpoint"
        );
    }
    result
}

/// Rebuild the `mhlo` ops encoded as custom calls by the legalization.
pub fn decode_fallbacks(ctx: &mut IrContext, module: Module) -> ApplyResult {
    PatternApplicator::new(reverse_type_converter())
        .add_pattern(DecodeFallbackPattern)
        .with_max_iterations(MAX_ITERATIONS)
        .apply_partial(ctx, module)
}

/// Ops that may remain after full legalization.
pub fn legalize_target() -> ConversionTarget {
    let mut target = ConversionTarget::new();
    target.add_illegal_dialect("mhlo");
    target.add_legal_dialect("stablehlo");
    target.add_legal_dialect("func");
    target.add_legal_dialect("core");
    target
}

fn legalize_applicator(options: &LegalizeOptions) -> PatternApplicator {
    PatternApplicator::new(hlo_type_converter())
        .add_pattern(LegalizeHloPattern::new(*options))
        .with_max_iterations(MAX_ITERATIONS)
}

/// Converts one `mhlo` op according to its feature tier.
pub struct LegalizeHloPattern {
    options: LegalizeOptions,
}

impl LegalizeHloPattern {
    pub fn new(options: LegalizeOptions) -> Self {
        Self { options }
    }

    fn encode(
        &self,
        ctx: &mut IrContext,
        op: OpRef,
        rewriter: &mut PatternRewriter,
        version: Option<i64>,
    ) -> bool {
        match encode_fallback(ctx, op, rewriter.type_converter(), version) {
            Ok(call) => {
                rewriter.replace_op(call);
                true
            }
            Err(err) => {
                debug!("cannot encode {}: {err}", ctx.op_full_name(op));
                false
            }
        }
    }
}

impl RewritePattern for LegalizeHloPattern {
    fn match_and_rewrite(
        &self,
        ctx: &mut IrContext,
        op: OpRef,
        rewriter: &mut PatternRewriter,
    ) -> bool {
        match classify(ctx, op) {
            FeatureTier::Private => {
                debug!("{} is private to mhlo", ctx.op_full_name(op));
                false
            }
            FeatureTier::Experimental if !self.options.allow_experimental_features => {
                debug!(
                    "{} uses experimental features, which are not allowed",
                    ctx.op_full_name(op)
                );
                false
            }
            FeatureTier::Experimental => self.encode(ctx, op, rewriter, None),
            FeatureTier::Public(version) => self.encode(ctx, op, rewriter, Some(version)),
            FeatureTier::FullySupported => {
                let Some(target) = Catalog::global().lookup(ctx.op(op).name) else {
                    return false;
                };
                match translate_direct(ctx, op, rewriter.type_converter(), target) {
                    Ok(new_op) => {
                        trace!("{} -> stablehlo.{}", ctx.op_full_name(op), target.name);
                        rewriter.replace_op(new_op);
                        true
                    }
                    Err(err) => {
                        debug!("cannot translate {}: {err}", ctx.op_full_name(op));
                        false
                    }
                }
            }
            FeatureTier::Unsupported => false,
        }
    }

    fn name(&self) -> &'static str {
        "LegalizeHloPattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlo_ir::Attribute;

    use crate::test_util::{TestIr, mhlo_enum};

    #[test]
    fn target_rejects_leftover_mhlo() {
        let mut ir = TestIr::new(1);
        let a = ir.args[0];
        let copy = ir.mhlo("copy", &[a], vec![]);
        ir.op("stablehlo", "abs", &[a], vec![]);

        let illegal = legalize_target().verify(&ir.ctx, ir.module.body(&ir.ctx).unwrap());
        assert_eq!(illegal.len(), 1);
        assert_eq!(illegal[0].op, copy);
    }

    #[test]
    fn pattern_respects_experimental_option() {
        let mut ir = TestIr::new(2);
        let (a, b) = (ir.args[0], ir.args[1]);
        ir.mhlo("all_to_all", &[a, b], vec![]);

        let result =
            legalize_to_stablehlo_partial(&mut ir.ctx, ir.module, &LegalizeOptions::default());
        assert_eq!(result.total_changes, 0);
        assert!(ir.ctx.op_is(ir.body_ops()[0], "mhlo", "all_to_all"));

        let options = LegalizeOptions::new().allow_experimental_features(true);
        legalize_to_stablehlo_partial(&mut ir.ctx, ir.module, &options);
        let call = ir.body_ops()[0];
        assert!(ir.ctx.op_is(call, "stablehlo", "custom_call"));
        assert_eq!(
            ir.attr(call, "call_target_name"),
            Some(&Attribute::from("mhlo.all_to_all"))
        );
    }

    #[test]
    fn uses_are_rewired_to_the_replacement() {
        let mut ir = TestIr::new(1);
        let a = ir.args[0];
        let tan = ir.mhlo("tan", &[a], vec![]);
        let tan_value = ir.ctx.op_result(tan, 0);
        let cmp = ir.mhlo(
            "compare",
            &[tan_value, a],
            vec![("comparison_direction", mhlo_enum("comparison_direction", "GT"))],
        );
        let cmp_value = ir.ctx.op_result(cmp, 0);
        ir.mhlo("return", &[cmp_value], vec![]);

        legalize_to_stablehlo(&mut ir.ctx, ir.module, &LegalizeOptions::default()).unwrap();
        let ops = ir.body_ops();
        assert_eq!(ops.len(), 3);
        assert!(ir.ctx.op_is(ops[0], "stablehlo", "custom_call"));
        assert!(ir.ctx.op_is(ops[1], "stablehlo", "compare"));
        assert!(ir.ctx.op_is(ops[2], "stablehlo", "return"));
        assert_eq!(ir.ctx.op_operands(ops[1])[0], ir.ctx.op_result(ops[0], 0));
        assert_eq!(ir.ctx.op_operands(ops[2]), &[ir.ctx.op_result(ops[1], 0)]);
    }
}
