//! Outlining of an op's region into a standalone `func.func`.

use hlo_ir::dialect::func;
use hlo_ir::rewrite::TypeConverter;
use hlo_ir::rewrite::helpers::{inline_region_blocks, values_defined_above};
use hlo_ir::{IrContext, Module, OpRef, RegionData, Symbol, SymbolTable};
use smallvec::smallvec;
use tracing::debug;

use crate::error::RegionExtractError;

/// Move the sole region of `op` into a new `func.func` in the enclosing
/// module, returning the (uniquified) name of the function.
///
/// The region must consist of one block that uses no values defined outside
/// of it. Block argument types are converted in place; the signature is the
/// converted argument types to the converted terminator operand types. Every
/// check runs before the first mutation, so on error the IR and the module's
/// symbols are unchanged.
pub fn extract_region(
    ctx: &mut IrContext,
    op: OpRef,
    converter: &TypeConverter,
) -> Result<Symbol, RegionExtractError> {
    let op_name = || ctx.op_full_name(op);

    let Some(&region) = ctx.op(op).regions.first() else {
        return Err(RegionExtractError::MissingRegion { op: op_name() });
    };
    let blocks = &ctx.region(region).blocks;
    if blocks.len() != 1 {
        return Err(RegionExtractError::MultipleBlocks {
            op: op_name(),
            blocks: blocks.len(),
        });
    }
    let block = blocks[0];

    let captured = values_defined_above(ctx, region);
    if !captured.is_empty() {
        return Err(RegionExtractError::CapturesValues {
            op: op_name(),
            count: captured.len(),
        });
    }

    let Some(terminator) = ctx.block_terminator(block) else {
        return Err(RegionExtractError::MissingTerminator { op: op_name() });
    };
    let Some(module) = Module::enclosing(ctx, op) else {
        return Err(RegionExtractError::NoEnclosingModule { op: op_name() });
    };

    let arg_types: Vec<_> = ctx.block(block).args.iter().map(|arg| arg.ty).collect();
    let inputs = converter.convert_types(&mut ctx.types, &arg_types)?;
    let returned: Vec<_> = ctx
        .op_operands(terminator)
        .iter()
        .map(|&v| ctx.value_ty(v))
        .collect();
    let results = converter.convert_types(&mut ctx.types, &returned)?;

    // Commit.
    for (index, &ty) in inputs.iter().enumerate() {
        ctx.set_block_arg_type(block, index as u32, ty);
    }
    let location = ctx.region(region).location;
    let body = ctx.create_region(RegionData {
        location,
        blocks: smallvec![],
        parent_op: None,
    });
    inline_region_blocks(ctx, region, body);

    let fn_ty = func::fn_type(&mut ctx.types, &inputs, &results);
    let (requested, op_location) = (ctx.op(op).name, ctx.op(op).location);
    let func_op = func::func(ctx, op_location, requested, fn_ty, body);
    let name = SymbolTable::new(ctx, module).insert(ctx, func_op);
    debug!("outlined region of {} as @{name}", ctx.op_full_name(op));
    Ok(name)
}
