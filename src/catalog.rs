//! Dispatch table of directly translatable ops.
//!
//! The table is generated from `catalog/stablehlo.toml`, which lists every
//! `stablehlo` op reachable by a 1:1 rebuild of an `mhlo` op together with
//! the traits the rebuild needs (region count, dense-array attributes), and
//! the enum vocabulary `stablehlo` defines. It is parsed once on first use.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use hlo_ir::Symbol;
use serde::Deserialize;

use crate::error::CatalogError;

const STABLEHLO_CATALOG: &str = include_str!("../catalog/stablehlo.toml");

static GLOBAL: LazyLock<Catalog> = LazyLock::new(|| {
    Catalog::parse(STABLEHLO_CATALOG).expect("embedded stablehlo catalog is well-formed")
});

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    op: BTreeMap<String, OpEntry>,
    #[serde(default)]
    enums: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OpEntry {
    source: Option<String>,
    regions: Option<usize>,
    variadic_regions: bool,
    dense_i64_array: bool,
}

/// Number of regions a target op owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionArity {
    Fixed(usize),
    /// One region per branch; at least one.
    Variadic,
}

impl RegionArity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            RegionArity::Fixed(n) => count == n,
            RegionArity::Variadic => count >= 1,
        }
    }
}

impl std::fmt::Display for RegionArity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionArity::Fixed(n) => write!(f, "{n}"),
            RegionArity::Variadic => f.write_str("at least 1"),
        }
    }
}

/// Target of a direct translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetOp {
    /// `stablehlo` opcode name.
    pub name: Symbol,
    pub regions: RegionArity,
    /// Dense integer element attributes of this op become `array<i64>`.
    pub dense_i64_array: bool,
}

/// Name-indexed dispatch table plus the target enum vocabulary.
#[derive(Debug)]
pub struct Catalog {
    by_source: HashMap<Symbol, TargetOp>,
    enums: HashMap<Symbol, HashSet<Symbol>>,
}

impl Catalog {
    /// Parse a catalog in the `stablehlo.toml` format.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;

        let mut by_source: HashMap<Symbol, TargetOp> = HashMap::with_capacity(file.op.len());
        for (name, entry) in &file.op {
            let regions = match (entry.regions, entry.variadic_regions) {
                (Some(_), true) => {
                    return Err(CatalogError::ConflictingRegions { op: name.clone() });
                }
                (_, true) => RegionArity::Variadic,
                (n, false) => RegionArity::Fixed(n.unwrap_or(0)),
            };
            let source = Symbol::from_dynamic(entry.source.as_deref().unwrap_or(name));
            let target = TargetOp {
                name: Symbol::from_dynamic(name),
                regions,
                dense_i64_array: entry.dense_i64_array,
            };
            if let Some(previous) = by_source.insert(source, target) {
                return Err(CatalogError::DuplicateSource {
                    op: name.clone(),
                    other: previous.name.to_string(),
                    source_op: source.to_string(),
                });
            }
        }

        let enums = file
            .enums
            .iter()
            .map(|(kind, values)| {
                let values = values.iter().map(|v| Symbol::from_dynamic(v)).collect();
                (Symbol::from_dynamic(kind), values)
            })
            .collect();

        Ok(Self { by_source, enums })
    }

    /// The catalog embedded in this crate.
    pub fn global() -> &'static Catalog {
        &GLOBAL
    }

    /// Target of the `mhlo` op named `source`, if it translates directly.
    pub fn lookup(&self, source: Symbol) -> Option<&TargetOp> {
        self.by_source.get(&source)
    }

    pub fn contains(&self, source: Symbol) -> bool {
        self.by_source.contains_key(&source)
    }

    /// Whether `stablehlo` defines `value` for the enum `kind`.
    pub fn has_enum_value(&self, kind: Symbol, value: Symbol) -> bool {
        self.enums
            .get(&kind)
            .is_some_and(|values| values.contains(&value))
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
