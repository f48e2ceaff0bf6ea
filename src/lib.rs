//! Legalization of MHLO programs into StableHLO.
//!
//! Every `mhlo` op is sorted into a [`FeatureTier`]:
//!
//! - fully supported ops are rebuilt 1:1 as `stablehlo` ops through the
//!   [`Catalog`];
//! - public and (when allowed) experimental ops are encoded as
//!   `stablehlo.custom_call`s that carry the original opcode and attributes,
//!   with any region outlined into a `func.func`;
//! - private ops are never converted.
//!
//! [`decode_fallbacks`] undoes the encoding, so a legalized module can be
//! taken back to `mhlo`.
//!
//! ```ignore
//! let options = LegalizeOptions::new().allow_experimental_features(true);
//! legalize_to_stablehlo(&mut ctx, module, &options)?;
//! ```

pub mod attr;
pub mod catalog;
pub mod decode;
pub mod direct;
pub mod error;
pub mod fallback;
pub mod names;
pub mod options;
pub mod pass;
pub mod region;
pub mod tier;
pub mod types;

#[cfg(test)]
mod test_util;

pub use catalog::{Catalog, RegionArity, TargetOp};
pub use decode::{DecodeFallbackPattern, decode_fallback};
pub use direct::translate_direct;
pub use error::{
    AttrError, CatalogError, DecodeError, DirectError, EncodeError, LegalizeError,
    RegionExtractError,
};
pub use fallback::encode_fallback;
pub use options::LegalizeOptions;
pub use pass::{
    LegalizeHloPattern, decode_fallbacks, legalize_target, legalize_to_stablehlo,
    legalize_to_stablehlo_partial,
};
pub use region::extract_region;
pub use tier::{FeatureTier, classify, public_version};
pub use types::{hlo_type_converter, reverse_type_converter};
