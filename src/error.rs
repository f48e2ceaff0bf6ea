//! Error types for legalization.
//!
//! Every per-op failure is a local non-match: patterns log the error and leave
//! the op untouched. Only the full-conversion entry point surfaces an error to
//! the caller.

use derive_more::{Display, From};
use hlo_ir::rewrite::{IllegalOp, TypeConversionError};

/// An attribute with no counterpart in the target vocabulary.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum AttrError {
    #[display("enum `{kind}` value `{value}` has no stablehlo counterpart")]
    UnknownEnum { kind: String, value: String },

    #[display("`{attr}` has no stablehlo counterpart")]
    Untranslatable { attr: String },

    #[display("`precision_config` must be an array of precision values, got `{attr}`")]
    MalformedPrecisionConfig { attr: String },
}

impl std::error::Error for AttrError {}

/// A region that cannot become a standalone procedure.
#[derive(Clone, Debug, Display, From, PartialEq, Eq)]
pub enum RegionExtractError {
    #[display("`{op}` has no region to extract")]
    #[from(ignore)]
    MissingRegion { op: String },

    #[display("region of `{op}` has {blocks} blocks; only single-block regions can be extracted")]
    #[from(ignore)]
    MultipleBlocks { op: String, blocks: usize },

    #[display(
        "region of `{op}` captures {count} value(s) defined above it; \
         only regions that do not capture outer values can be extracted"
    )]
    #[from(ignore)]
    CapturesValues { op: String, count: usize },

    #[display("region of `{op}` does not end in a terminator")]
    #[from(ignore)]
    MissingTerminator { op: String },

    #[display("`{op}` is not nested in a module")]
    #[from(ignore)]
    NoEnclosingModule { op: String },

    #[display("{_0}")]
    Type(TypeConversionError),
}

impl std::error::Error for RegionExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegionExtractError::Type(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure to express an op as a `stablehlo.custom_call`.
#[derive(Clone, Debug, Display, From, PartialEq, Eq)]
pub enum EncodeError {
    #[display("`{op}` has {count} regions; only single-region ops can be encoded")]
    #[from(ignore)]
    MultipleRegions { op: String, count: usize },

    #[display("attribute `{name}`: {source}")]
    #[from(ignore)]
    Attr { name: String, source: AttrError },

    #[display("{_0}")]
    Type(TypeConversionError),

    #[display("{_0}")]
    Region(RegionExtractError),
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Attr { source, .. } => Some(source),
            EncodeError::Type(err) => Some(err),
            EncodeError::Region(err) => Some(err),
            EncodeError::MultipleRegions { .. } => None,
        }
    }
}

/// Failure to rebuild an op 1:1 under `stablehlo`.
#[derive(Clone, Debug, Display, From, PartialEq, Eq)]
pub enum DirectError {
    #[display("`{op}` has {found} regions, `{target}` expects {expected}")]
    #[from(ignore)]
    RegionCount {
        op: String,
        target: String,
        expected: String,
        found: usize,
    },

    #[display("attribute `{name}`: {source}")]
    #[from(ignore)]
    Attr { name: String, source: AttrError },

    #[display("{_0}")]
    Type(TypeConversionError),
}

impl std::error::Error for DirectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectError::Attr { source, .. } => Some(source),
            DirectError::Type(err) => Some(err),
            DirectError::RegionCount { .. } => None,
        }
    }
}

/// Failure to rebuild the original op from a `stablehlo.custom_call`.
#[derive(Clone, Debug, Display, From, PartialEq, Eq)]
pub enum DecodeError {
    #[display("custom call does not carry an encoded mhlo op")]
    #[from(ignore)]
    NotEncoded,

    #[display("called computation `{name}` is not defined in the module")]
    #[from(ignore)]
    MissingComputation { name: String },

    #[display("called computation `{name}` is referenced elsewhere and cannot be inlined")]
    #[from(ignore)]
    SharedComputation { name: String },

    #[display("expected exactly one called computation, found {count}")]
    #[from(ignore)]
    CalledComputationCount { count: usize },

    #[display("attribute `{name}`: {source}")]
    #[from(ignore)]
    Attr { name: String, source: AttrError },

    #[display("{_0}")]
    Type(TypeConversionError),
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Attr { source, .. } => Some(source),
            DecodeError::Type(err) => Some(err),
            _ => None,
        }
    }
}

/// Full conversion left ops that have no legal form.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum LegalizeError {
    #[display("failed to legalize {} op(s): {}", _0.len(), format_illegal(_0))]
    IllegalOps(Vec<IllegalOp>),
}

impl std::error::Error for LegalizeError {}

fn format_illegal(ops: &[IllegalOp]) -> String {
    ops.iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The embedded or user-supplied op catalog is malformed.
#[derive(Debug, Display, From)]
pub enum CatalogError {
    #[display("malformed catalog: {_0}")]
    Parse(toml::de::Error),

    #[display("`{op}` and `{other}` both translate from `mhlo.{source_op}`")]
    #[from(ignore)]
    DuplicateSource {
        op: String,
        other: String,
        source_op: String,
    },

    #[display("`{op}` sets both `regions` and `variadic_regions`")]
    #[from(ignore)]
    ConflictingRegions { op: String },
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
