//! Reverse of the fallback encoding.
//!
//! A `stablehlo.custom_call` whose `call_target_name` names an `mhlo` op and
//! which carries `mhlo.attributes` is rebuilt into that op. An outlined
//! region is moved back out of its function, and the function is erased.
//!
//! Encoded attributes go back through [`reverse_attr`], which turns every
//! `stablehlo` dialect attribute into `mhlo`. An op that already carried a
//! `stablehlo` attribute before encoding therefore comes back with the
//! `mhlo` form of it.

use std::collections::BTreeMap;

use hlo_ir::dialect::func;
use hlo_ir::rewrite::helpers::inline_region_blocks;
use hlo_ir::rewrite::{PatternRewriter, RewritePattern, TypeConverter};
use hlo_ir::symbol_table::symbol_users;
use hlo_ir::{
    Attribute, BlockRef, IrContext, Module, OpRef, OperationDataBuilder, RegionData, RegionRef,
    Symbol, SymbolTable, TypeRef,
};
use smallvec::smallvec;
use tracing::{debug, trace};

use crate::attr::{decode_precision_config, reverse_attr};
use crate::error::DecodeError;
use crate::names::{
    ATTR_CALL_TARGET_NAME, ATTR_CALLED_COMPUTATIONS, ATTR_MHLO_ATTRIBUTES, ATTR_PRECISION_CONFIG,
    CUSTOM_CALL, MHLO, MHLO_PREFIX, STABLEHLO,
};

/// Outlined region to move back into the decoded op.
struct Computation {
    func: OpRef,
    body: RegionRef,
    block_args: Vec<(BlockRef, u32, TypeRef)>,
}

/// Build a detached `mhlo` op from an encoded `stablehlo.custom_call`.
///
/// On success the referenced function, if any, has been erased and its body
/// now belongs to the returned op. On error nothing has been mutated.
pub fn decode_fallback(
    ctx: &mut IrContext,
    op: OpRef,
    converter: &TypeConverter,
) -> Result<OpRef, DecodeError> {
    let data = ctx.op(op);
    if data.dialect != STABLEHLO() || data.name != CUSTOM_CALL() {
        return Err(DecodeError::NotEncoded);
    }
    let Some(Attribute::String(target)) = data.attributes.get(&ATTR_CALL_TARGET_NAME()) else {
        return Err(DecodeError::NotEncoded);
    };
    let Some(name) = target.strip_prefix(MHLO_PREFIX) else {
        return Err(DecodeError::NotEncoded);
    };
    let name = Symbol::from_dynamic(name);
    let Some(Attribute::Dict(encoded)) = data.attributes.get(&ATTR_MHLO_ATTRIBUTES()) else {
        return Err(DecodeError::NotEncoded);
    };
    let attrs = decode_attributes(encoded)?;
    let called = data.attributes.get(&ATTR_CALLED_COMPUTATIONS()).cloned();

    let result_types = ctx.op_result_types(op).to_vec();
    let result_types = converter.convert_types(&mut ctx.types, &result_types)?;
    let computation = match called {
        Some(called) => Some(find_computation(ctx, op, &called, converter)?),
        None => None,
    };

    // Commit.
    let location = ctx.op(op).location;
    let mut builder = OperationDataBuilder::new(location, MHLO(), name)
        .operands(ctx.op_operands(op).to_vec())
        .results(result_types)
        .attrs(attrs);
    if let Some(computation) = computation {
        for (block, index, ty) in computation.block_args {
            ctx.set_block_arg_type(block, index, ty);
        }
        let region_location = ctx.region(computation.body).location;
        let region = ctx.create_region(RegionData {
            location: region_location,
            blocks: smallvec![],
            parent_op: None,
        });
        inline_region_blocks(ctx, computation.body, region);
        builder = builder.region(region);

        if let Some(module) = Module::enclosing(ctx, computation.func) {
            let func_name = func::sym_name(ctx, computation.func);
            SymbolTable::new(ctx, module).erase(ctx, computation.func);
            debug!("inlined @{} back into mhlo.{name}", func_name.unwrap_or(name));
        }
    }
    let data = builder.build(ctx);
    Ok(ctx.create_op(data))
}

fn decode_attributes(
    encoded: &BTreeMap<Symbol, Attribute>,
) -> Result<BTreeMap<Symbol, Attribute>, DecodeError> {
    encoded
        .iter()
        .map(|(&key, value)| {
            let decoded = if key == ATTR_PRECISION_CONFIG() {
                decode_precision_config(value).map_err(|source| DecodeError::Attr {
                    name: key.to_string(),
                    source,
                })?
            } else {
                reverse_attr(value)
            };
            Ok((key, decoded))
        })
        .collect()
}

fn find_computation(
    ctx: &mut IrContext,
    op: OpRef,
    called: &Attribute,
    converter: &TypeConverter,
) -> Result<Computation, DecodeError> {
    let name = match called {
        Attribute::List(items) => match items.as_slice() {
            [Attribute::SymbolRef(name)] => *name,
            _ => return Err(DecodeError::CalledComputationCount { count: items.len() }),
        },
        _ => return Err(DecodeError::CalledComputationCount { count: 0 }),
    };
    let missing = || DecodeError::MissingComputation {
        name: name.to_string(),
    };
    let module = Module::enclosing(ctx, op).ok_or_else(missing)?;
    let func_op = SymbolTable::new(ctx, module)
        .lookup(ctx, name)
        .filter(|&f| func::is_func(ctx, f))
        .ok_or_else(missing)?;
    if symbol_users(ctx, module, name) != [op] {
        return Err(DecodeError::SharedComputation {
            name: name.to_string(),
        });
    }
    let body = func::body(ctx, func_op).ok_or_else(missing)?;

    let blocks: Vec<BlockRef> = ctx.region(body).blocks.to_vec();
    let mut block_args = Vec::new();
    for block in blocks {
        let arg_types: Vec<TypeRef> = ctx.block(block).args.iter().map(|arg| arg.ty).collect();
        for (index, ty) in arg_types.into_iter().enumerate() {
            let converted = converter.convert_type(&mut ctx.types, ty)?;
            if converted != ty {
                block_args.push((block, index as u32, converted));
            }
        }
    }
    Ok(Computation {
        func: func_op,
        body,
        block_args,
    })
}

/// Rewrites encoded custom calls back into the `mhlo` ops they stand for.
pub struct DecodeFallbackPattern;

impl RewritePattern for DecodeFallbackPattern {
    fn match_and_rewrite(
        &self,
        ctx: &mut IrContext,
        op: OpRef,
        rewriter: &mut PatternRewriter,
    ) -> bool {
        if !ctx.op_is(op, "stablehlo", "custom_call") {
            return false;
        }
        match decode_fallback(ctx, op, rewriter.type_converter()) {
            Ok(decoded) => {
                trace!("decoded custom call into {}", ctx.op_full_name(decoded));
                rewriter.replace_op(decoded);
                true
            }
            Err(DecodeError::NotEncoded) => false,
            Err(err) => {
                debug!("cannot decode custom call: {err}");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "DecodeFallbackPattern"
    }
}
