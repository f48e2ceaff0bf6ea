//! Type mappings between `mhlo` and `stablehlo`.
//!
//! Only the dialect-owned types need a rule; builtin tensors and scalars are
//! rebuilt by the converter's recursion whenever one of their components
//! changes.

use hlo_ir::TypeDataBuilder;
use hlo_ir::rewrite::{TypeConversion, TypeConverter};

use crate::names::{ASYNC_BUNDLE, MHLO, STABLEHLO, TOKEN};

/// Converter used when legalizing `mhlo` to `stablehlo`.
///
/// `mhlo.token` becomes `stablehlo.token`; `mhlo.async_bundle` only exists
/// around private async ops and has no legal form.
pub fn hlo_type_converter() -> TypeConverter {
    TypeConverter::new().with_conversion(|types, ty| {
        if types.is_dialect(ty, MHLO(), TOKEN()) {
            let token = TypeDataBuilder::new(STABLEHLO(), TOKEN()).build();
            TypeConversion::Convert(types.intern(token))
        } else if types.is_dialect(ty, MHLO(), ASYNC_BUNDLE()) {
            TypeConversion::Illegal
        } else {
            TypeConversion::Skip
        }
    })
}

/// Converter used when decoding custom calls back into `mhlo`.
pub fn reverse_type_converter() -> TypeConverter {
    TypeConverter::new().with_conversion(|types, ty| {
        if types.is_dialect(ty, STABLEHLO(), TOKEN()) {
            TypeConversion::Convert(types.intern(TypeDataBuilder::new(MHLO(), TOKEN()).build()))
        } else {
            TypeConversion::Skip
        }
    })
}
