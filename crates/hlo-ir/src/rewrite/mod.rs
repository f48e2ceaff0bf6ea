//! Rewrite infrastructure.
//!
//! In-place mutation + RAUW-based rewriting: patterns record a replacement on
//! a [`PatternRewriter`], the [`PatternApplicator`] splices it in and
//! iterates to a fixpoint, and a [`ConversionTarget`] verifies the result.

pub mod applicator;
pub mod conversion_target;
pub mod helpers;
pub mod pattern;
pub mod rewriter;
pub mod type_converter;

pub use applicator::{ApplyResult, PatternApplicator};
pub use conversion_target::{ConversionTarget, IllegalOp, LegalityCheck};
pub use pattern::RewritePattern;
pub use rewriter::PatternRewriter;
pub use type_converter::{TypeConversion, TypeConversionError, TypeConverter};

use crate::context::IrContext;
use crate::dialect::core;
use crate::refs::{BlockRef, OpRef, RegionRef};
use crate::symbol::Symbol;
use crate::types::Attribute;

/// Thin wrapper around an `OpRef` pointing to a `core.module` operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Module(pub OpRef);

impl Module {
    /// Create a `Module` wrapper, verifying it points to a `core.module` op.
    pub fn new(ctx: &IrContext, op: OpRef) -> Option<Self> {
        let data = ctx.op(op);
        if data.dialect == core::DIALECT_NAME() && data.name == core::MODULE() {
            Some(Module(op))
        } else {
            None
        }
    }

    /// Nearest `core.module` enclosing `op` (not counting `op` itself).
    pub fn enclosing(ctx: &IrContext, op: OpRef) -> Option<Self> {
        let mut current = ctx.parent_op(op);
        while let Some(parent) = current {
            if let Some(module) = Module::new(ctx, parent) {
                return Some(module);
            }
            current = ctx.parent_op(parent);
        }
        None
    }

    pub fn op(self) -> OpRef {
        self.0
    }

    pub fn body(self, ctx: &IrContext) -> Option<RegionRef> {
        ctx.op(self.0).regions.first().copied()
    }

    /// All top-level operations in the module's first block.
    pub fn ops(self, ctx: &IrContext) -> Vec<OpRef> {
        match self.first_block(ctx) {
            Some(block) => ctx.block(block).ops.to_vec(),
            None => vec![],
        }
    }

    pub fn name(self, ctx: &IrContext) -> Option<Symbol> {
        match ctx.op(self.0).attributes.get(&core::ATTR_SYM_NAME()) {
            Some(Attribute::Symbol(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn first_block(self, ctx: &IrContext) -> Option<BlockRef> {
        let region = self.body(ctx)?;
        ctx.region(region).blocks.first().copied()
    }
}
