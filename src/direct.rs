//! 1:1 rebuild of fully supported ops under `stablehlo`.

use std::collections::BTreeMap;

use hlo_ir::rewrite::TypeConverter;
use hlo_ir::{Attribute, BlockRef, IrContext, OpRef, OperationDataBuilder, Symbol, TypeRef};

use crate::attr::{translate_attr, translate_dense_array};
use crate::catalog::TargetOp;
use crate::error::DirectError;
use crate::names::{ATTR_CUSTOM_CALL_SCHEDULE, STABLEHLO};
use crate::tier::is_schedule_none;

/// Build a detached `stablehlo.<target>` equivalent to `op`.
///
/// The new op takes the same operands, the converted result types and the
/// translated attributes, and adopts the regions of `op` with their block
/// argument types converted in place. Nothing is mutated unless every
/// conversion succeeds.
pub fn translate_direct(
    ctx: &mut IrContext,
    op: OpRef,
    converter: &TypeConverter,
    target: &TargetOp,
) -> Result<OpRef, DirectError> {
    let region_count = ctx.op(op).regions.len();
    if !target.regions.accepts(region_count) {
        return Err(DirectError::RegionCount {
            op: ctx.op_full_name(op),
            target: format!("stablehlo.{}", target.name),
            expected: target.regions.to_string(),
            found: region_count,
        });
    }

    let result_types = ctx.op_result_types(op).to_vec();
    let result_types = converter.convert_types(&mut ctx.types, &result_types)?;
    let attrs = translate_attributes(ctx, op, target)?;
    let block_args = convert_block_args(ctx, op, converter)?;

    for (block, index, ty) in block_args {
        ctx.set_block_arg_type(block, index, ty);
    }
    let regions = ctx.take_regions(op);
    let location = ctx.op(op).location;
    let data = OperationDataBuilder::new(location, STABLEHLO(), target.name)
        .operands(ctx.op_operands(op).to_vec())
        .results(result_types)
        .attrs(attrs)
        .regions(regions)
        .build(ctx);
    Ok(ctx.create_op(data))
}

fn translate_attributes(
    ctx: &IrContext,
    op: OpRef,
    target: &TargetOp,
) -> Result<BTreeMap<Symbol, Attribute>, DirectError> {
    let mut translated = BTreeMap::new();
    for (&name, value) in &ctx.op(op).attributes {
        if name == ATTR_CUSTOM_CALL_SCHEDULE() && is_schedule_none(value) {
            continue;
        }
        let dense = target
            .dense_i64_array
            .then(|| translate_dense_array(value))
            .flatten();
        let value = match dense {
            Some(array) => array,
            None => translate_attr(value).map_err(|source| DirectError::Attr {
                name: name.to_string(),
                source,
            })?,
        };
        translated.insert(name, value);
    }
    Ok(translated)
}

/// Block argument types that change, for every block of every region.
fn convert_block_args(
    ctx: &mut IrContext,
    op: OpRef,
    converter: &TypeConverter,
) -> Result<Vec<(BlockRef, u32, TypeRef)>, DirectError> {
    let blocks: Vec<BlockRef> = ctx
        .op(op)
        .regions
        .iter()
        .flat_map(|&region| ctx.region(region).blocks.iter().copied())
        .collect();

    let mut changes = Vec::new();
    for block in blocks {
        let arg_types: Vec<TypeRef> = ctx.block(block).args.iter().map(|arg| arg.ty).collect();
        for (index, ty) in arg_types.into_iter().enumerate() {
            let converted = converter.convert_type(&mut ctx.types, ty)?;
            if converted != ty {
                changes.push((block, index as u32, converted));
            }
        }
    }
    Ok(changes)
}
