//! Structured dialect attributes shared by the `mhlo` and `stablehlo` dialects.
//!
//! Both dialects define the same record shapes (channel handles, dimension
//! numbers, operand aliases); a [`DialectAttr`] pairs one of these records
//! with the dialect that owns it, so `#mhlo<precision DEFAULT>` and
//! `#stablehlo<precision DEFAULT>` are distinct attributes.

use std::fmt;

use crate::symbol::Symbol;

/// An attribute owned by a dialect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DialectAttr {
    pub dialect: Symbol,
    pub data: DialectAttrData,
}

impl DialectAttr {
    pub fn new(dialect: Symbol, data: DialectAttrData) -> Self {
        Self { dialect, data }
    }

    /// Enum attribute, printed as `#mhlo<precision HIGHEST>`.
    pub fn enumeration(dialect: Symbol, kind: Symbol, value: Symbol) -> Self {
        Self::new(dialect, DialectAttrData::Enum { kind, value })
    }

    /// Returns the enum value if this is an enum attribute of the given kind.
    pub fn as_enum(&self, kind: &str) -> Option<Symbol> {
        match &self.data {
            DialectAttrData::Enum { kind: k, value } if *k == kind => Some(*value),
            _ => None,
        }
    }

    /// Mnemonic of the attribute kind, used by the printer.
    pub fn mnemonic(&self) -> String {
        match &self.data {
            DialectAttrData::Enum { kind, .. } => kind.to_string(),
            DialectAttrData::ChannelHandle(_) => "channel_handle".to_owned(),
            DialectAttrData::ConvDimensionNumbers(_) => "conv".to_owned(),
            DialectAttrData::DotDimensionNumbers(_) => "dot".to_owned(),
            DialectAttrData::GatherDimensionNumbers(_) => "gather".to_owned(),
            DialectAttrData::ScatterDimensionNumbers(_) => "scatter".to_owned(),
            DialectAttrData::OutputOperandAlias(_) => "output_operand_alias".to_owned(),
            DialectAttrData::Opaque { kind, .. } => kind.to_string(),
        }
    }
}

impl fmt::Display for DialectAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}<{} ", self.dialect, self.mnemonic())?;
        match &self.data {
            DialectAttrData::Enum { value, .. } => write!(f, "{value}")?,
            DialectAttrData::ChannelHandle(h) => write!(f, "handle = {}, type = {}", h.handle, h.ty)?,
            DialectAttrData::ConvDimensionNumbers(d) => write!(f, "{d}")?,
            DialectAttrData::DotDimensionNumbers(d) => write!(
                f,
                "lhs_batching_dimensions = {:?}, rhs_batching_dimensions = {:?}, \
                 lhs_contracting_dimensions = {:?}, rhs_contracting_dimensions = {:?}",
                d.lhs_batching_dimensions,
                d.rhs_batching_dimensions,
                d.lhs_contracting_dimensions,
                d.rhs_contracting_dimensions
            )?,
            DialectAttrData::GatherDimensionNumbers(d) => write!(
                f,
                "offset_dims = {:?}, collapsed_slice_dims = {:?}, start_index_map = {:?}, \
                 index_vector_dim = {}",
                d.offset_dims, d.collapsed_slice_dims, d.start_index_map, d.index_vector_dim
            )?,
            DialectAttrData::ScatterDimensionNumbers(d) => write!(
                f,
                "update_window_dims = {:?}, inserted_window_dims = {:?}, \
                 scatter_dims_to_operand_dims = {:?}, index_vector_dim = {}",
                d.update_window_dims,
                d.inserted_window_dims,
                d.scatter_dims_to_operand_dims,
                d.index_vector_dim
            )?,
            DialectAttrData::OutputOperandAlias(a) => write!(
                f,
                "output_tuple_indices = {:?}, operand_index = {}, operand_tuple_indices = {:?}",
                a.output_tuple_indices, a.operand_index, a.operand_tuple_indices
            )?,
            DialectAttrData::Opaque { body, .. } => f.write_str(body)?,
        }
        f.write_str(">")
    }
}

/// Payload of a [`DialectAttr`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DialectAttrData {
    /// Enumerated symbol of the given enum kind (`precision`, `comparison_direction`, ...).
    Enum { kind: Symbol, value: Symbol },
    ChannelHandle(ChannelHandle),
    ConvDimensionNumbers(ConvDimensionNumbers),
    DotDimensionNumbers(DotDimensionNumbers),
    GatherDimensionNumbers(GatherDimensionNumbers),
    ScatterDimensionNumbers(ScatterDimensionNumbers),
    OutputOperandAlias(OutputOperandAlias),
    /// Dialect attribute carried as its textual body only.
    Opaque { kind: Symbol, body: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub handle: i64,
    pub ty: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConvDimensionNumbers {
    pub input_batch_dimension: i64,
    pub input_feature_dimension: i64,
    pub input_spatial_dimensions: Vec<i64>,
    pub kernel_input_feature_dimension: i64,
    pub kernel_output_feature_dimension: i64,
    pub kernel_spatial_dimensions: Vec<i64>,
    pub output_batch_dimension: i64,
    pub output_feature_dimension: i64,
    pub output_spatial_dimensions: Vec<i64>,
}

impl ConvDimensionNumbers {
    fn write_layout(
        f: &mut fmt::Formatter<'_>,
        spatial: &[i64],
        non_spatial: [(i64, char); 2],
    ) -> fmt::Result {
        let rank = spatial
            .iter()
            .copied()
            .chain(non_spatial.iter().map(|&(d, _)| d))
            .max()
            .unwrap_or(-1)
            + 1;
        let mut slots: Vec<Option<String>> = vec![None; rank.max(0) as usize];
        for (i, &d) in spatial.iter().enumerate() {
            if let Some(slot) = usize::try_from(d).ok().and_then(|d| slots.get_mut(d)) {
                *slot = Some(i.to_string());
            }
        }
        for (d, c) in non_spatial {
            if let Some(slot) = usize::try_from(d).ok().and_then(|d| slots.get_mut(d)) {
                *slot = Some(c.to_string());
            }
        }
        f.write_str("[")?;
        for (i, slot) in slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(slot.as_deref().unwrap_or("?"))?;
        }
        f.write_str("]")
    }
}

/// Prints the compact layout form, e.g. `[b, 0, 1, f]x[0, 1, i, o]->[b, 0, 1, f]`.
///
/// Dimensions not covered by any role print as `?`.
impl fmt::Display for ConvDimensionNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_layout(
            f,
            &self.input_spatial_dimensions,
            [
                (self.input_batch_dimension, 'b'),
                (self.input_feature_dimension, 'f'),
            ],
        )?;
        f.write_str("x")?;
        Self::write_layout(
            f,
            &self.kernel_spatial_dimensions,
            [
                (self.kernel_input_feature_dimension, 'i'),
                (self.kernel_output_feature_dimension, 'o'),
            ],
        )?;
        f.write_str("->")?;
        Self::write_layout(
            f,
            &self.output_spatial_dimensions,
            [
                (self.output_batch_dimension, 'b'),
                (self.output_feature_dimension, 'f'),
            ],
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DotDimensionNumbers {
    pub lhs_batching_dimensions: Vec<i64>,
    pub rhs_batching_dimensions: Vec<i64>,
    pub lhs_contracting_dimensions: Vec<i64>,
    pub rhs_contracting_dimensions: Vec<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GatherDimensionNumbers {
    pub offset_dims: Vec<i64>,
    pub collapsed_slice_dims: Vec<i64>,
    pub start_index_map: Vec<i64>,
    pub index_vector_dim: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScatterDimensionNumbers {
    pub update_window_dims: Vec<i64>,
    pub inserted_window_dims: Vec<i64>,
    pub scatter_dims_to_operand_dims: Vec<i64>,
    pub index_vector_dim: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OutputOperandAlias {
    pub output_tuple_indices: Vec<i64>,
    pub operand_index: i64,
    pub operand_tuple_indices: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nhwc() -> ConvDimensionNumbers {
        ConvDimensionNumbers {
            input_batch_dimension: 0,
            input_feature_dimension: 3,
            input_spatial_dimensions: vec![1, 2],
            kernel_input_feature_dimension: 2,
            kernel_output_feature_dimension: 3,
            kernel_spatial_dimensions: vec![0, 1],
            output_batch_dimension: 0,
            output_feature_dimension: 3,
            output_spatial_dimensions: vec![1, 2],
        }
    }

    #[test]
    fn conv_dimension_numbers_layout() {
        assert_eq!(nhwc().to_string(), "[b, 0, 1, f]x[0, 1, i, o]->[b, 0, 1, f]");
    }

    #[test]
    fn conv_dimension_numbers_unknown_dimension() {
        let dims = ConvDimensionNumbers {
            input_spatial_dimensions: vec![1],
            ..nhwc()
        };
        // Dimension 2 of the input is not covered by any role.
        assert_eq!(
            dims.to_string(),
            "[b, 0, ?, f]x[0, 1, i, o]->[b, 0, 1, f]"
        );
    }

    #[test]
    fn enum_display() {
        let attr = DialectAttr::enumeration(
            Symbol::new("mhlo"),
            Symbol::new("precision"),
            Symbol::new("HIGHEST"),
        );
        assert_eq!(attr.to_string(), "#mhlo<precision HIGHEST>");
        assert_eq!(attr.as_enum("precision"), Some(Symbol::new("HIGHEST")));
        assert_eq!(attr.as_enum("transpose"), None);
    }
}
