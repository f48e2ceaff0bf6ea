//! Arena-based mutable IR for HLO programs.
//!
//! Operations, values, blocks and regions live in `PrimaryMap`s owned by an
//! [`IrContext`]; use-chains make RAUW cheap, and the [`rewrite`] module
//! provides pattern-driven conversion on top of it. Types and attributes are
//! generic over dialects, with the structured attributes shared by `mhlo` and
//! `stablehlo` in [`attrs`].

pub mod attrs;
pub mod context;
pub mod dialect;
pub mod location;
pub mod printer;
pub mod refs;
pub mod rewrite;
pub mod symbol;
pub mod symbol_table;
pub mod types;
pub mod walk;

// Re-export smallvec for downstream crates
pub use smallvec;

pub use attrs::{DialectAttr, DialectAttrData};
pub use context::{
    BlockArgData, BlockData, IrContext, OperationData, OperationDataBuilder, RegionData, Use,
    ValueData,
};
pub use location::{Location, Span};
pub use refs::{BlockRef, OpRef, PathRef, RegionRef, TypeRef, ValueDef, ValueRef};
pub use rewrite::Module;
pub use symbol::Symbol;
pub use symbol_table::SymbolTable;
pub use types::{Attribute, PathInterner, TypeData, TypeDataBuilder, TypeInterner};
pub use walk::WalkAction;
