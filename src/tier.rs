//! Compatibility tiers of `mhlo` ops.
//!
//! Each op family that needs more than a catalog lookup owns a small set of
//! predicates. Classification checks them in precedence order: Private, then
//! Experimental, then Public. An op that trips none of them is fully
//! supported when the catalog knows how to rebuild it.

use std::collections::HashMap;
use std::sync::LazyLock;

use hlo_ir::{Attribute, DialectAttrData, IrContext, OpRef, Symbol};

use crate::catalog::Catalog;
use crate::names::{
    ATTR_API_VERSION, ATTR_CUSTOM_CALL_SCHEDULE, ATTR_DIMENSION_NUMBERS, ATTR_PRECISION_CONFIG,
    ENUM_CUSTOM_CALL_SCHEDULE, ENUM_PRECISION, MHLO, PACKED_NIBBLE, SCHEDULE_NONE,
};

/// `api_version` of custom calls using the typed FFI.
pub const TYPED_FFI_API_VERSION: i64 = 4;

/// How an `mhlo` op may be expressed in `stablehlo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureTier {
    /// Internal to the source compiler; never converted.
    Private,
    /// Encoded as a custom call only when experimental features are allowed.
    Experimental,
    /// Encoded as a custom call carrying this compatibility version.
    Public(i64),
    /// Rebuilt 1:1 under `stablehlo`.
    FullySupported,
    /// No translation exists.
    Unsupported,
}

type Predicate = fn(&IrContext, OpRef) -> bool;
type VersionFn = fn(&IrContext, OpRef) -> Option<i64>;

#[derive(Clone, Copy, Default)]
struct FamilyPredicates {
    private: Option<Predicate>,
    experimental: Option<Predicate>,
    public: Option<VersionFn>,
}

impl FamilyPredicates {
    const ALWAYS_PRIVATE: Self = Self {
        private: Some(always),
        experimental: None,
        public: None,
    };
}

const PRIVATE_OPS: &[&str] = &[
    "add_dependency",
    "async_start",
    "async_update",
    "async_done",
    "bitcast",
    "copy",
    "domain",
    "fusion",
    "stochastic_convert",
    // Names are matched without the `mhlo.` prefix; this op's own name is dotted.
    "xla.rng_get_and_update_state",
];

static FAMILIES: LazyLock<HashMap<Symbol, FamilyPredicates>> = LazyLock::new(|| {
    let mut families = HashMap::new();
    for &name in PRIVATE_OPS {
        families.insert(Symbol::new(name), FamilyPredicates::ALWAYS_PRIVATE);
    }

    let collective = FamilyPredicates {
        experimental: Some(has_tuple_operands),
        ..Default::default()
    };
    families.insert(Symbol::new("all_reduce"), collective);
    families.insert(Symbol::new("all_to_all"), collective);

    families.insert(
        Symbol::new("convolution"),
        FamilyPredicates {
            private: Some(has_unknown_conv_dimension),
            experimental: Some(has_packed_nibble),
            public: None,
        },
    );
    let dot = FamilyPredicates {
        experimental: Some(has_packed_nibble),
        ..Default::default()
    };
    families.insert(Symbol::new("dot"), dot);
    families.insert(Symbol::new("dot_general"), dot);

    families.insert(
        Symbol::new("custom_call"),
        FamilyPredicates {
            private: Some(has_custom_schedule),
            experimental: None,
            public: Some(typed_ffi_version),
        },
    );
    families.insert(
        Symbol::new("tan"),
        FamilyPredicates {
            public: Some(version_1),
            ..Default::default()
        },
    );
    families.insert(
        Symbol::new("topk"),
        FamilyPredicates {
            public: Some(version_1),
            ..Default::default()
        },
    );
    families
});

/// Compute the tier of `op`.
pub fn classify(ctx: &IrContext, op: OpRef) -> FeatureTier {
    let data = ctx.op(op);
    if data.dialect != MHLO() {
        return FeatureTier::Unsupported;
    }

    if let Some(family) = FAMILIES.get(&data.name) {
        if family.private.is_some_and(|p| p(ctx, op)) {
            return FeatureTier::Private;
        }
        if family.experimental.is_some_and(|p| p(ctx, op)) {
            return FeatureTier::Experimental;
        }
        if let Some(version) = family.public.and_then(|p| p(ctx, op)) {
            return FeatureTier::Public(version);
        }
    }

    if Catalog::global().contains(data.name) {
        FeatureTier::FullySupported
    } else {
        FeatureTier::Unsupported
    }
}

/// Compatibility version of a Public-tier op.
pub fn public_version(ctx: &IrContext, op: OpRef) -> Option<i64> {
    match classify(ctx, op) {
        FeatureTier::Public(version) => Some(version),
        _ => None,
    }
}

fn always(_: &IrContext, _: OpRef) -> bool {
    true
}

fn version_1(_: &IrContext, _: OpRef) -> Option<i64> {
    Some(1)
}

/// Tuple form of a collective: anything but exactly one operand.
fn has_tuple_operands(ctx: &IrContext, op: OpRef) -> bool {
    ctx.op_operands(op).len() != 1
}

fn has_unknown_conv_dimension(ctx: &IrContext, op: OpRef) -> bool {
    match ctx.op(op).attributes.get(&ATTR_DIMENSION_NUMBERS()) {
        Some(Attribute::Dialect(attr)) => match &attr.data {
            DialectAttrData::ConvDimensionNumbers(dims) => dims.to_string().contains('?'),
            _ => false,
        },
        _ => false,
    }
}

fn has_packed_nibble(ctx: &IrContext, op: OpRef) -> bool {
    let Some(Attribute::List(entries)) = ctx.op(op).attributes.get(&ATTR_PRECISION_CONFIG()) else {
        return false;
    };
    entries.iter().any(|entry| match entry {
        Attribute::Dialect(attr) => attr
            .as_enum(ENUM_PRECISION)
            .is_some_and(|value| value == PACKED_NIBBLE),
        _ => false,
    })
}

fn has_custom_schedule(ctx: &IrContext, op: OpRef) -> bool {
    let Some(schedule) = ctx.op(op).attributes.get(&ATTR_CUSTOM_CALL_SCHEDULE()) else {
        return false;
    };
    !is_schedule_none(schedule)
}

fn typed_ffi_version(ctx: &IrContext, op: OpRef) -> Option<i64> {
    let api_version = ctx.op(op).attributes.get(&ATTR_API_VERSION())?;
    (api_version.as_i64() == Some(TYPED_FFI_API_VERSION)).then_some(1)
}

/// Whether `attr` is the no-op default `custom_call_schedule`.
pub(crate) fn is_schedule_none(attr: &Attribute) -> bool {
    match attr {
        Attribute::Dialect(attr) => attr
            .as_enum(ENUM_CUSTOM_CALL_SCHEDULE)
            .is_some_and(|value| value == SCHEDULE_NONE),
        _ => false,
    }
}
