//! Region moves and capture analysis used when outlining HLO regions.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use smallvec::SmallVec;

use crate::context::IrContext;
use crate::refs::{BlockRef, RegionRef, ValueRef};
use crate::walk::{self, WalkAction};

/// Move every block of `src_region` to the end of `dest_region`.
///
/// Returns the moved blocks; `src_region` is left empty.
pub fn inline_region_blocks(
    ctx: &mut IrContext,
    src_region: RegionRef,
    dest_region: RegionRef,
) -> Vec<BlockRef> {
    if src_region == dest_region {
        return Vec::new();
    }

    let src_blocks: SmallVec<[BlockRef; 4]> =
        std::mem::take(&mut ctx.region_mut(src_region).blocks);
    for &b in &src_blocks {
        ctx.block_mut(b).parent_region = Some(dest_region);
    }
    ctx.region_mut(dest_region)
        .blocks
        .extend(src_blocks.iter().copied());
    src_blocks.to_vec()
}

/// Values used inside `region` (at any depth) but defined outside of it.
///
/// Returned in ascending `ValueRef` order, without duplicates.
pub fn values_defined_above(ctx: &IrContext, region: RegionRef) -> Vec<ValueRef> {
    let mut captured = BTreeSet::new();
    let _ = walk::walk_region::<()>(ctx, region, &mut |op| {
        for &v in ctx.op_operands(op) {
            let inside = ctx
                .value_block(v)
                .is_some_and(|b| ctx.region_contains_block(region, b));
            if !inside {
                captured.insert(v);
            }
        }
        ControlFlow::Continue(WalkAction::Advance)
    });
    captured.into_iter().collect()
}
