//! `func` dialect: procedures, returns and the `func.fn` signature type.
//!
//! A `func.fn` type keeps its inputs as type params and its results in the
//! `results` attribute, so `(a, b) -> (c)` interns as
//! `func.fn(a, b) {results = [c]}`.

use crate::context::{IrContext, OperationDataBuilder};
use crate::location::Location;
use crate::refs::{OpRef, RegionRef, TypeRef, ValueRef};
use crate::symbol::Symbol;
use crate::types::{Attribute, TypeDataBuilder, TypeInterner};

crate::symbols! {
    DIALECT_NAME => "func",
    FUNC => "func",
    RETURN => "return",
    FN_TYPE => "fn",
    ATTR_SYM_NAME => "sym_name",
    ATTR_TYPE => "type",
    ATTR_RESULTS => "results",
}

/// Intern the signature type `(inputs) -> (results)`.
pub fn fn_type(types: &mut TypeInterner, inputs: &[TypeRef], results: &[TypeRef]) -> TypeRef {
    types.intern(
        TypeDataBuilder::new(DIALECT_NAME(), FN_TYPE())
            .params(inputs.iter().copied())
            .attr(
                ATTR_RESULTS(),
                Attribute::List(results.iter().map(|&t| Attribute::Type(t)).collect()),
            )
            .build(),
    )
}

/// Split a `func.fn` type into its inputs and results.
pub fn fn_type_parts(types: &TypeInterner, ty: TypeRef) -> Option<(Vec<TypeRef>, Vec<TypeRef>)> {
    let data = types.get(ty);
    if data.dialect != DIALECT_NAME() || data.name != FN_TYPE() {
        return None;
    }
    let results = match data.attrs.get(&ATTR_RESULTS()) {
        Some(Attribute::List(items)) => items
            .iter()
            .filter_map(|a| match a {
                Attribute::Type(t) => Some(*t),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some((data.params.to_vec(), results))
}

/// Create a detached `func.func @name` owning `body`.
pub fn func(
    ctx: &mut IrContext,
    loc: Location,
    name: Symbol,
    fn_ty: TypeRef,
    body: RegionRef,
) -> OpRef {
    let data = OperationDataBuilder::new(loc, DIALECT_NAME(), FUNC())
        .attr(ATTR_SYM_NAME(), Attribute::Symbol(name))
        .attr(ATTR_TYPE(), Attribute::Type(fn_ty))
        .region(body)
        .build(ctx);
    ctx.create_op(data)
}

/// Create a detached `func.return` of `values`.
pub fn r#return(
    ctx: &mut IrContext,
    loc: Location,
    values: impl IntoIterator<Item = ValueRef>,
) -> OpRef {
    let data = OperationDataBuilder::new(loc, DIALECT_NAME(), RETURN())
        .operands(values)
        .build(ctx);
    ctx.create_op(data)
}

pub fn is_func(ctx: &IrContext, op: OpRef) -> bool {
    let data = ctx.op(op);
    data.dialect == DIALECT_NAME() && data.name == FUNC()
}

pub fn is_return(ctx: &IrContext, op: OpRef) -> bool {
    let data = ctx.op(op);
    data.dialect == DIALECT_NAME() && data.name == RETURN()
}

pub fn sym_name(ctx: &IrContext, op: OpRef) -> Option<Symbol> {
    match ctx.op(op).attributes.get(&ATTR_SYM_NAME()) {
        Some(Attribute::Symbol(s)) => Some(*s),
        _ => None,
    }
}

pub fn body(ctx: &IrContext, op: OpRef) -> Option<RegionRef> {
    ctx.op(op).regions.first().copied()
}

/// Inputs and results of a `func.func`.
pub fn signature(ctx: &IrContext, op: OpRef) -> Option<(Vec<TypeRef>, Vec<TypeRef>)> {
    match ctx.op(op).attributes.get(&ATTR_TYPE()) {
        Some(Attribute::Type(ty)) => fn_type_parts(&ctx.types, *ty),
        _ => None,
    }
}
