//! Fallback encoding of ops `stablehlo` cannot express natively.
//!
//! The op becomes a `stablehlo.custom_call` with the same operands and
//! converted result types:
//!
//! | attribute             | value                                   |
//! |-----------------------|-----------------------------------------|
//! | `call_target_name`    | full original opcode, e.g. `"mhlo.tan"` |
//! | `mhlo.attributes`     | translated attributes of the op         |
//! | `called_computations` | `[@fn]` when the op owned a region      |
//! | `mhlo.version`        | compatibility version of public ops     |

use std::collections::BTreeMap;

use hlo_ir::rewrite::TypeConverter;
use hlo_ir::{Attribute, IrContext, OpRef, OperationDataBuilder, Symbol};

use crate::attr::{encode_precision_config, translate_attr};
use crate::error::EncodeError;
use crate::names::{
    ATTR_CALL_TARGET_NAME, ATTR_CALLED_COMPUTATIONS, ATTR_CUSTOM_CALL_SCHEDULE,
    ATTR_MHLO_ATTRIBUTES, ATTR_MHLO_VERSION, ATTR_PRECISION_CONFIG, CUSTOM_CALL, STABLEHLO,
};
use crate::region::extract_region;
use crate::tier::is_schedule_none;

/// Build a detached `stablehlo.custom_call` encoding `op`.
///
/// `version` is the compatibility version of a Public-tier op, `None` for
/// experimental ones. The op's region, if any, is outlined into a function;
/// that is the last fallible step, so on error nothing has been mutated.
pub fn encode_fallback(
    ctx: &mut IrContext,
    op: OpRef,
    converter: &TypeConverter,
    version: Option<i64>,
) -> Result<OpRef, EncodeError> {
    let region_count = ctx.op(op).regions.len();
    if region_count > 1 {
        return Err(EncodeError::MultipleRegions {
            op: ctx.op_full_name(op),
            count: region_count,
        });
    }

    let result_types = ctx.op_result_types(op).to_vec();
    let result_types = converter.convert_types(&mut ctx.types, &result_types)?;
    let encoded = encode_attributes(ctx, op)?;

    let called = if region_count == 1 {
        Some(extract_region(ctx, op, converter)?)
    } else {
        None
    };

    let location = ctx.op(op).location;
    let mut builder = OperationDataBuilder::new(location, STABLEHLO(), CUSTOM_CALL())
        .operands(ctx.op_operands(op).to_vec())
        .results(result_types)
        .attr(
            ATTR_CALL_TARGET_NAME(),
            Attribute::String(ctx.op_full_name(op)),
        )
        .attr(ATTR_MHLO_ATTRIBUTES(), Attribute::Dict(encoded));
    if let Some(name) = called {
        builder = builder.attr(
            ATTR_CALLED_COMPUTATIONS(),
            Attribute::List(vec![Attribute::SymbolRef(name)]),
        );
    }
    if let Some(version) = version {
        builder = builder.attr(ATTR_MHLO_VERSION(), Attribute::from(version));
    }
    let data = builder.build(ctx);
    Ok(ctx.create_op(data))
}

fn encode_attributes(
    ctx: &IrContext,
    op: OpRef,
) -> Result<BTreeMap<Symbol, Attribute>, EncodeError> {
    let mut encoded = BTreeMap::new();
    for (&name, value) in &ctx.op(op).attributes {
        if name == ATTR_CUSTOM_CALL_SCHEDULE() && is_schedule_none(value) {
            continue;
        }
        let translated = if name == ATTR_PRECISION_CONFIG() {
            encode_precision_config(value)
        } else {
            translate_attr(value)
        };
        let translated = translated.map_err(|source| EncodeError::Attr {
            name: name.to_string(),
            source,
        })?;
        encoded.insert(name, translated);
    }
    Ok(encoded)
}
