//! `core` dialect: the top-level module.

use smallvec::smallvec;

use crate::context::{BlockData, IrContext, OperationDataBuilder, RegionData};
use crate::location::Location;
use crate::refs::OpRef;
use crate::symbol::Symbol;
use crate::types::Attribute;

crate::symbols! {
    DIALECT_NAME => "core",
    MODULE => "module",
    ATTR_SYM_NAME => "sym_name",
}

/// Create an empty `core.module @name` with a single empty body block.
pub fn module(ctx: &mut IrContext, loc: Location, name: Symbol) -> OpRef {
    let block = ctx.create_block(BlockData {
        location: loc,
        args: vec![],
        ops: smallvec![],
        parent_region: None,
    });
    let region = ctx.create_region(RegionData {
        location: loc,
        blocks: smallvec![block],
        parent_op: None,
    });
    let data = OperationDataBuilder::new(loc, DIALECT_NAME(), MODULE())
        .attr(ATTR_SYM_NAME(), Attribute::Symbol(name))
        .region(region)
        .build(ctx);
    ctx.create_op(data)
}

/// Append a detached operation to the first block of a module body.
///
/// Does nothing if the module has no body block.
pub fn push_to_module(ctx: &mut IrContext, module: OpRef, op: OpRef) {
    let Some(&region) = ctx.op(module).regions.first() else {
        return;
    };
    if let Some(&block) = ctx.region(region).blocks.first() {
        ctx.push_op(block, op);
    }
}
