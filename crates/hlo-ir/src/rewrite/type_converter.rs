//! Type converter: maps types during dialect conversion.
//!
//! Conversion rules are tried in order. A rule either skips the type,
//! converts it, or declares it illegal. When every rule skips, the converter
//! recurses into the type's params (and any types nested in its attrs) and
//! re-interns the type if a component changed.

use derive_more::{Display, Error};
use smallvec::SmallVec;

use crate::refs::TypeRef;
use crate::types::{Attribute, TypeData, TypeInterner};

/// Outcome of a single conversion rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeConversion {
    /// The rule does not apply; try the next one.
    Skip,
    /// The type converts to this type.
    Convert(TypeRef),
    /// The type has no legal counterpart.
    Illegal,
}

/// A type with no legal conversion.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
#[display("type `{dialect}.{name}` has no legal conversion")]
pub struct TypeConversionError {
    pub dialect: String,
    pub name: String,
}

impl TypeConversionError {
    fn from_data(data: &TypeData) -> Self {
        Self {
            dialect: data.dialect.to_string(),
            name: data.name.to_string(),
        }
    }
}

type ConversionFn = dyn Fn(&mut TypeInterner, TypeRef) -> TypeConversion;

#[derive(Default)]
pub struct TypeConverter {
    conversions: Vec<Box<ConversionFn>>,
}

impl TypeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversion rule.
    pub fn add_conversion(
        &mut self,
        f: impl Fn(&mut TypeInterner, TypeRef) -> TypeConversion + 'static,
    ) {
        self.conversions.push(Box::new(f));
    }

    /// Builder-style [`add_conversion`](Self::add_conversion).
    pub fn with_conversion(
        mut self,
        f: impl Fn(&mut TypeInterner, TypeRef) -> TypeConversion + 'static,
    ) -> Self {
        self.add_conversion(f);
        self
    }

    /// Convert a type. Types no rule touches convert to themselves, with
    /// their components converted.
    pub fn convert_type(
        &self,
        types: &mut TypeInterner,
        ty: TypeRef,
    ) -> Result<TypeRef, TypeConversionError> {
        for conv in &self.conversions {
            match conv(types, ty) {
                TypeConversion::Skip => continue,
                TypeConversion::Convert(converted) => return Ok(converted),
                TypeConversion::Illegal => {
                    return Err(TypeConversionError::from_data(types.get(ty)));
                }
            }
        }

        let data = types.get(ty).clone();
        let mut changed = false;
        let mut params = SmallVec::with_capacity(data.params.len());
        for &param in &data.params {
            let converted = self.convert_type(types, param)?;
            changed |= converted != param;
            params.push(converted);
        }
        let mut attrs = data.attrs.clone();
        for attr in attrs.values_mut() {
            changed |= self.convert_attr_types(types, attr)?;
        }

        if !changed {
            return Ok(ty);
        }
        Ok(types.intern(TypeData {
            dialect: data.dialect,
            name: data.name,
            params,
            attrs,
        }))
    }

    /// Convert every type in `tys`, failing on the first illegal one.
    pub fn convert_types(
        &self,
        types: &mut TypeInterner,
        tys: &[TypeRef],
    ) -> Result<SmallVec<[TypeRef; 4]>, TypeConversionError> {
        tys.iter().map(|&t| self.convert_type(types, t)).collect()
    }

    fn convert_attr_types(
        &self,
        types: &mut TypeInterner,
        attr: &mut Attribute,
    ) -> Result<bool, TypeConversionError> {
        match attr {
            Attribute::Type(t) => {
                let converted = self.convert_type(types, *t)?;
                let changed = converted != *t;
                *t = converted;
                Ok(changed)
            }
            Attribute::List(items) => {
                let mut changed = false;
                for item in items {
                    changed |= self.convert_attr_types(types, item)?;
                }
                Ok(changed)
            }
            _ => Ok(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }
}
