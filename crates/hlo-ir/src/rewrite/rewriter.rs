//! The handle a pattern uses to hand its replacement op to the applicator.

use crate::context::IrContext;
use crate::refs::{OpRef, ValueRef};
use crate::rewrite::type_converter::TypeConverter;

/// Passed to [`RewritePattern::match_and_rewrite`](super::RewritePattern).
///
/// A pattern builds its replacement detached and records it here; the
/// applicator splices it in once the pattern has returned.
pub struct PatternRewriter<'a> {
    type_converter: &'a TypeConverter,
    replacement: Option<OpRef>,
}

impl<'a> PatternRewriter<'a> {
    pub(crate) fn new(type_converter: &'a TypeConverter) -> Self {
        Self {
            type_converter,
            replacement: None,
        }
    }

    /// Type converter of the running pass.
    pub fn type_converter(&self) -> &'a TypeConverter {
        self.type_converter
    }

    /// Replace the matched op with `new_op`, which must produce as many
    /// results.
    pub fn replace_op(&mut self, new_op: OpRef) {
        debug_assert!(self.replacement.is_none(), "op replaced twice");
        self.replacement = Some(new_op);
    }

    pub(crate) fn into_replacement(self) -> Option<OpRef> {
        self.replacement
    }
}

/// Put `new_op` where `old_op` was and rewire every use of its results.
pub(crate) fn replace_in_place(ctx: &mut IrContext, old_op: OpRef, new_op: OpRef) {
    let old_results: Vec<ValueRef> = ctx.op_results(old_op).to_vec();
    let new_results: Vec<ValueRef> = ctx.op_results(new_op).to_vec();
    debug_assert_eq!(
        old_results.len(),
        new_results.len(),
        "{} has {} results, its replacement {}",
        ctx.op_full_name(old_op),
        old_results.len(),
        new_results.len()
    );
    for (&old, &new) in old_results.iter().zip(&new_results) {
        ctx.replace_all_uses(old, new);
    }

    if let Some(block) = ctx.op(old_op).parent_block {
        ctx.insert_op_before(block, old_op, new_op);
        ctx.remove_op_from_block(block, old_op);
    }
    ctx.remove_op(old_op);
}
