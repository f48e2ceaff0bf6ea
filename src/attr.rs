//! Attribute translation between `mhlo` and `stablehlo`.
//!
//! Translation is a pure match over the attribute variants. `mhlo`-owned
//! attributes are rebuilt under `stablehlo` or rejected. Lists are
//! translated element-wise and a failing element fails the whole list, so a
//! partially translated attribute is never produced. Everything else,
//! dictionaries included, passes through unchanged.

use hlo_ir::{Attribute, DialectAttr, DialectAttrData, Symbol};

use crate::catalog::Catalog;
use crate::error::AttrError;
use crate::names::{ENUM_PRECISION, MHLO, PACKED_NIBBLE, STABLEHLO};

/// Precision values of the source dialect, including the ones `stablehlo`
/// cannot express.
const MHLO_PRECISIONS: &[&str] = &["DEFAULT", "HIGH", "HIGHEST", PACKED_NIBBLE];

/// Translate an `mhlo` attribute into its `stablehlo` counterpart.
pub fn translate_attr(attr: &Attribute) -> Result<Attribute, AttrError> {
    translate_attr_with(Catalog::global(), attr)
}

/// [`translate_attr`] against an explicit catalog.
pub fn translate_attr_with(catalog: &Catalog, attr: &Attribute) -> Result<Attribute, AttrError> {
    match attr {
        Attribute::Dialect(attr) if attr.dialect == MHLO() => {
            translate_dialect_attr(catalog, attr).map(Attribute::Dialect)
        }
        Attribute::List(items) => items
            .iter()
            .map(|item| translate_attr_with(catalog, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Attribute::List),
        other => Ok(other.clone()),
    }
}

fn translate_dialect_attr(catalog: &Catalog, attr: &DialectAttr) -> Result<DialectAttr, AttrError> {
    match &attr.data {
        DialectAttrData::Enum { kind, value } => {
            if catalog.has_enum_value(*kind, *value) {
                Ok(DialectAttr::enumeration(STABLEHLO(), *kind, *value))
            } else {
                Err(AttrError::UnknownEnum {
                    kind: kind.to_string(),
                    value: value.to_string(),
                })
            }
        }
        DialectAttrData::Opaque { .. } => Err(AttrError::Untranslatable {
            attr: attr.to_string(),
        }),
        record => Ok(DialectAttr::new(STABLEHLO(), record.clone())),
    }
}

/// Dense integer elements as a dense `i64` array, for ops whose `stablehlo`
/// form takes `array<i64>` operands.
pub fn translate_dense_array(attr: &Attribute) -> Option<Attribute> {
    match attr {
        Attribute::DenseInts { values, .. } => Some(Attribute::DenseI64Array(values.clone())),
        _ => None,
    }
}

/// Re-express a `precision_config` array as the names of its values.
///
/// This is the only encoding that survives `PACKED_NIBBLE`, which has no
/// `stablehlo` enum value.
pub fn encode_precision_config(attr: &Attribute) -> Result<Attribute, AttrError> {
    let malformed = || AttrError::MalformedPrecisionConfig {
        attr: format!("{attr:?}"),
    };
    let Attribute::List(entries) = attr else {
        return Err(malformed());
    };
    entries
        .iter()
        .map(|entry| match entry {
            Attribute::Dialect(dialect_attr) if dialect_attr.dialect == MHLO() => dialect_attr
                .as_enum(ENUM_PRECISION)
                .map(|value| Attribute::String(value.to_string()))
                .ok_or_else(malformed),
            _ => Err(malformed()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Attribute::List)
}

/// Inverse of [`encode_precision_config`].
pub fn decode_precision_config(attr: &Attribute) -> Result<Attribute, AttrError> {
    let malformed = || AttrError::MalformedPrecisionConfig {
        attr: format!("{attr:?}"),
    };
    let Attribute::List(entries) = attr else {
        return Err(malformed());
    };
    entries
        .iter()
        .map(|entry| match entry {
            Attribute::String(name) if MHLO_PRECISIONS.contains(&name.as_str()) => {
                Ok(Attribute::Dialect(DialectAttr::enumeration(
                    MHLO(),
                    Symbol::new(ENUM_PRECISION),
                    Symbol::from_dynamic(name),
                )))
            }
            Attribute::String(name) => Err(AttrError::UnknownEnum {
                kind: ENUM_PRECISION.to_owned(),
                value: name.clone(),
            }),
            _ => Err(malformed()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Attribute::List)
}

/// Translate a `stablehlo` attribute back into `mhlo`.
///
/// Every `stablehlo` attribute has an `mhlo` counterpart, so this cannot fail.
/// The mapping cannot tell a translated attribute from one that was already
/// `stablehlo` before encoding; both come back as `mhlo`. Dictionaries are
/// left alone, mirroring [`translate_attr`].
pub fn reverse_attr(attr: &Attribute) -> Attribute {
    match attr {
        Attribute::Dialect(attr) if attr.dialect == STABLEHLO() => {
            Attribute::Dialect(DialectAttr::new(MHLO(), attr.data.clone()))
        }
        Attribute::List(items) => Attribute::List(items.iter().map(reverse_attr).collect()),
        other => other.clone(),
    }
}
