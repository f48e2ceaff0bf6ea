//! PatternApplicator: visitor-based fixpoint iteration.
//!
//! Applies rewrite patterns to all operations in a module. Uses snapshots of
//! block operations and checks `parent_block` validity to skip deleted ops.
//! Nested regions are visited before the operation that owns them.

use tracing::trace;

use super::Module;
use super::conversion_target::{ConversionTarget, IllegalOp};
use super::pattern::RewritePattern;
use super::rewriter::{self, PatternRewriter};
use super::type_converter::TypeConverter;
use crate::context::IrContext;
use crate::refs::{BlockRef, OpRef, RegionRef};

/// Result of applying rewrite patterns.
#[derive(Debug)]
pub struct ApplyResult {
    /// Number of fixpoint iterations performed.
    pub iterations: usize,
    /// Total number of pattern matches (mutations applied).
    pub total_changes: usize,
    /// Whether the fixpoint was reached (no changes in last iteration).
    pub reached_fixpoint: bool,
}

impl ApplyResult {
    /// Verify that no illegal operations remain.
    pub fn verify(
        &self,
        ctx: &IrContext,
        module: Module,
        target: &ConversionTarget,
    ) -> Result<(), Vec<IllegalOp>> {
        let Some(body) = module.body(ctx) else {
            return Ok(());
        };
        let illegal = target.verify(ctx, body);
        if illegal.is_empty() {
            Ok(())
        } else {
            Err(illegal)
        }
    }
}

pub struct PatternApplicator {
    patterns: Vec<Box<dyn RewritePattern>>,
    max_iterations: usize,
    type_converter: TypeConverter,
}

impl PatternApplicator {
    pub fn new(type_converter: TypeConverter) -> Self {
        Self {
            patterns: Vec::new(),
            max_iterations: 10,
            type_converter,
        }
    }

    pub fn add_pattern(mut self, pattern: impl RewritePattern + 'static) -> Self {
        self.patterns.push(Box::new(pattern));
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn type_converter(&self) -> &TypeConverter {
        &self.type_converter
    }

    /// Apply patterns and verify the result.
    pub fn apply(
        &self,
        ctx: &mut IrContext,
        module: Module,
        target: &ConversionTarget,
    ) -> Result<ApplyResult, Vec<IllegalOp>> {
        let result = self.apply_partial(ctx, module);
        result.verify(ctx, module, target)?;
        Ok(result)
    }

    /// Apply patterns without verification.
    pub fn apply_partial(&self, ctx: &mut IrContext, module: Module) -> ApplyResult {
        let mut total_changes = 0;
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;
            let changes = match module.body(ctx) {
                Some(body) => self.visit_region(ctx, body),
                None => 0,
            };
            total_changes += changes;
            if changes == 0 {
                return ApplyResult {
                    iterations,
                    total_changes,
                    reached_fixpoint: true,
                };
            }
        }

        ApplyResult {
            iterations,
            total_changes,
            reached_fixpoint: false,
        }
    }

    fn visit_region(&self, ctx: &mut IrContext, region: RegionRef) -> usize {
        let mut changes = 0;
        let blocks: Vec<BlockRef> = ctx.region(region).blocks.to_vec();
        for block in blocks {
            changes += self.visit_block(ctx, block);
        }
        changes
    }

    fn visit_block(&self, ctx: &mut IrContext, block: BlockRef) -> usize {
        let mut changes = 0;

        // Snapshot the ops in this block
        let ops: Vec<OpRef> = ctx.block(block).ops.to_vec();

        for op in ops {
            if ctx.op(op).parent_block != Some(block) {
                continue;
            }

            let regions: Vec<RegionRef> = ctx.op(op).regions.to_vec();
            for region in regions {
                changes += self.visit_region(ctx, region);
            }

            // Nested processing may have removed this op
            if ctx.op(op).parent_block != Some(block) {
                continue;
            }

            for pattern in &self.patterns {
                let mut rw = PatternRewriter::new(&self.type_converter);
                if !pattern.match_and_rewrite(ctx, op, &mut rw) {
                    continue;
                }
                let Some(new_op) = rw.into_replacement() else {
                    continue;
                };
                trace!(pattern = pattern.name(), %op, "pattern applied");
                rewriter::replace_in_place(ctx, op, new_op);
                changes += 1;
                // One pattern per op per iteration.
                break;
            }
        }

        changes
    }
}
