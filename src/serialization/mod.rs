//! Format-agnostic serialization of values, types and whole trees
//!
//! A [`ValueSerializer`] knows how to turn each kind of platform value into
//! its format's element and back, and how to group elements into a document
//! ("target"). [`ConfigType`] drives the recursion for composite values, so
//! a format only ever handles one level at a time.
//!
//! Formats:
//! - [`JsonValueSerializer`] (always available)
//! - [`TomlValueSerializer`] (`toml` feature), which also writes node comments
//! - [`YamlValueSerializer`] (`yaml` feature)
//!
//! [`JsonTypeSerializer`] exports type descriptions as JSON.

mod json;
mod schema;
mod tree;

#[cfg(feature = "toml")]
mod toml_format;

#[cfg(feature = "yaml")]
mod yaml_format;

pub use json::JsonValueSerializer;
pub use schema::JsonTypeSerializer;
pub use tree::{deserialize, deserialize_tree, serialize, serialize_tree};

#[cfg(feature = "toml")]
pub use toml_format::{TomlDocument, TomlValueSerializer};

#[cfg(feature = "yaml")]
pub use yaml_format::YamlValueSerializer;

use crate::error::{DecodeError, Error, Result};
use crate::schema::{
    BooleanConfigType, ConfigType, ConfigValue, DecimalConfigType, EnumConfigType,
    ListConfigType, MapConfigType, RecordConfigType, StringConfigType,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::str::FromStr;

// =============================================================================
// ValueSerializer
// =============================================================================

/// Encodes and decodes platform values in one format.
///
/// Composite encoders receive their children already encoded; composite
/// decoders only split an element into raw children and leave decoding them
/// to the caller. Decoders must reject elements of the wrong shape with a
/// [`DecodeError`] rather than guessing.
pub trait ValueSerializer {
    /// One encoded value
    type Element;
    /// A document: named elements with optional comments
    type Target;

    fn serialize_boolean(&self, value: bool, ty: &BooleanConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a boolean.
    fn deserialize_boolean(
        &self,
        element: &Self::Element,
        ty: &BooleanConfigType,
    ) -> std::result::Result<bool, DecodeError>;

    fn serialize_number(&self, value: Decimal, ty: &DecimalConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a number.
    fn deserialize_number(
        &self,
        element: &Self::Element,
        ty: &DecimalConfigType,
    ) -> std::result::Result<Decimal, DecodeError>;

    fn serialize_string(&self, value: &str, ty: &StringConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a string.
    fn deserialize_string(
        &self,
        element: &Self::Element,
        ty: &StringConfigType,
    ) -> std::result::Result<String, DecodeError>;

    fn serialize_enum(&self, value: &str, ty: &EnumConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not an enum name.
    fn deserialize_enum(
        &self,
        element: &Self::Element,
        ty: &EnumConfigType,
    ) -> std::result::Result<String, DecodeError>;

    fn serialize_list(&self, elements: Vec<Self::Element>, ty: &ListConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a sequence.
    fn deserialize_list<'e>(
        &self,
        element: &'e Self::Element,
        ty: &ListConfigType,
    ) -> std::result::Result<Vec<&'e Self::Element>, DecodeError>;

    fn serialize_map(&self, entries: Vec<(String, Self::Element)>, ty: &MapConfigType) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a string-keyed mapping.
    fn deserialize_map<'e>(
        &self,
        element: &'e Self::Element,
        ty: &MapConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Self::Element)>, DecodeError>;

    fn serialize_record(
        &self,
        fields: Vec<(String, Self::Element)>,
        ty: &RecordConfigType,
    ) -> Self::Element;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a string-keyed mapping.
    fn deserialize_record<'e>(
        &self,
        element: &'e Self::Element,
        ty: &RecordConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Self::Element)>, DecodeError>;

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    fn new_target(&self) -> Self::Target;

    /// Add a named value. Formats without comments drop `comment`.
    fn add_element(
        &self,
        name: &str,
        element: Self::Element,
        target: &mut Self::Target,
        comment: Option<&str>,
    );

    /// Add a named nested document
    fn add_sub_element(
        &self,
        name: &str,
        sub: Self::Target,
        target: &mut Self::Target,
        comment: Option<&str>,
    );

    /// Named entries of a document, in document order
    fn elements<'t>(&self, target: &'t Self::Target) -> Vec<(&'t str, &'t Self::Element)>;

    /// Named entries of an element that holds a nested document
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element is not a nested document.
    fn sub_elements<'e>(
        &self,
        element: &'e Self::Element,
    ) -> std::result::Result<Vec<(&'e str, &'e Self::Element)>, DecodeError>;

    /// Parse a whole document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails or [`Error::Decode`] if the
    /// input is not a well-formed document.
    fn read_target(&self, reader: &mut dyn Read) -> Result<Self::Target>;

    /// Write a whole document
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or writing fails.
    fn write_target(&self, target: &Self::Target, writer: &mut dyn Write) -> Result<()>;
}

// =============================================================================
// TypeSerializer
// =============================================================================

/// Writes type descriptions into a format's container, one method per kind
pub trait TypeSerializer {
    type Target;

    fn serialize_boolean(&self, ty: &BooleanConfigType, target: &mut Self::Target);
    fn serialize_number(&self, ty: &DecimalConfigType, target: &mut Self::Target);
    fn serialize_string(&self, ty: &StringConfigType, target: &mut Self::Target);
    fn serialize_enum(&self, ty: &EnumConfigType, target: &mut Self::Target);
    fn serialize_list(&self, ty: &ListConfigType, target: &mut Self::Target);
    fn serialize_map(&self, ty: &MapConfigType, target: &mut Self::Target);
    fn serialize_record(&self, ty: &RecordConfigType, target: &mut Self::Target);
}

// =============================================================================
// Type-driven recursion
// =============================================================================

fn shape_mismatch(ty: &ConfigType, value: &ConfigValue) -> Error {
    Error::TypeMismatch {
        expected: ty.to_string(),
        actual: format!("{} {value}", value.kind_name()),
    }
}

impl ConfigType {
    /// Encode `value` with `serializer`, recursing into composite values.
    ///
    /// Only the value's shape is checked; constraints are not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the value's shape does not match
    /// this type at any depth.
    pub fn serialize_value<S: ValueSerializer>(
        &self,
        value: &ConfigValue,
        serializer: &S,
    ) -> Result<S::Element> {
        match (self, value) {
            (ConfigType::Boolean(ty), ConfigValue::Boolean(b)) => {
                Ok(serializer.serialize_boolean(*b, ty))
            }
            (ConfigType::Decimal(ty), ConfigValue::Number(n)) => {
                Ok(serializer.serialize_number(*n, ty))
            }
            (ConfigType::String(ty), ConfigValue::String(s)) => {
                Ok(serializer.serialize_string(s, ty))
            }
            (ConfigType::Enum(ty), ConfigValue::String(s)) => Ok(serializer.serialize_enum(s, ty)),
            (ConfigType::List(ty), ConfigValue::List(items)) => {
                let elements = items
                    .iter()
                    .map(|item| ty.element_type().serialize_value(item, serializer))
                    .collect::<Result<Vec<_>>>()?;
                Ok(serializer.serialize_list(elements, ty))
            }
            (ConfigType::Map(ty), ConfigValue::Map(map)) => {
                let entries = map
                    .iter()
                    .map(|(key, item)| {
                        Ok((key.clone(), ty.value_type().serialize_value(item, serializer)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(serializer.serialize_map(entries, ty))
            }
            (ConfigType::Record(ty), ConfigValue::Map(map)) => {
                let fields = ty
                    .fields()
                    .iter()
                    .map(|(name, field_type)| {
                        let field = map.get(name).ok_or_else(|| Error::TypeMismatch {
                            expected: self.to_string(),
                            actual: format!("record without field '{name}'"),
                        })?;
                        Ok((name.clone(), field_type.serialize_value(field, serializer)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(serializer.serialize_record(fields, ty))
            }
            _ => Err(shape_mismatch(self, value)),
        }
    }

    /// Decode an element into a platform value, recursing into composite
    /// elements. Constraints are not checked here.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] pointing at the first element that cannot
    /// be decoded, or at a record field that is missing.
    pub fn deserialize_value<S: ValueSerializer>(
        &self,
        element: &S::Element,
        serializer: &S,
    ) -> std::result::Result<ConfigValue, DecodeError> {
        match self {
            ConfigType::Boolean(ty) => serializer
                .deserialize_boolean(element, ty)
                .map(ConfigValue::Boolean),
            ConfigType::Decimal(ty) => serializer
                .deserialize_number(element, ty)
                .map(ConfigValue::Number),
            ConfigType::String(ty) => serializer
                .deserialize_string(element, ty)
                .map(ConfigValue::String),
            ConfigType::Enum(ty) => serializer
                .deserialize_enum(element, ty)
                .map(ConfigValue::String),
            ConfigType::List(ty) => serializer
                .deserialize_list(element, ty)?
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    ty.element_type()
                        .deserialize_value(item, serializer)
                        .map_err(|e| e.at_index(i))
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(ConfigValue::List),
            ConfigType::Map(ty) => serializer
                .deserialize_map(element, ty)?
                .into_iter()
                .map(|(key, item)| {
                    ty.value_type()
                        .deserialize_value(item, serializer)
                        .map(|value| (key.to_string(), value))
                        .map_err(|e| e.within(key))
                })
                .collect::<std::result::Result<BTreeMap<_, _>, _>>()
                .map(ConfigValue::Map),
            ConfigType::Record(ty) => {
                let entries: BTreeMap<&str, &S::Element> =
                    serializer.deserialize_record(element, ty)?.into_iter().collect();
                let mut fields = BTreeMap::new();
                for (name, field_type) in ty.fields() {
                    let Some(field) = entries.get(name.as_str()) else {
                        return Err(DecodeError::absent(
                            field_type.to_string(),
                            format!("Record field is absent: {name}"),
                        )
                        .within(name.as_str()));
                    };
                    let value = field_type
                        .deserialize_value(*field, serializer)
                        .map_err(|e| e.within(name.as_str()))?;
                    fields.insert(name.clone(), value);
                }
                Ok(ConfigValue::Map(fields))
            }
        }
    }

    /// Describe this type with `serializer`
    pub fn serialize_type<T: TypeSerializer>(&self, serializer: &T, target: &mut T::Target) {
        match self {
            ConfigType::Boolean(ty) => serializer.serialize_boolean(ty, target),
            ConfigType::Decimal(ty) => serializer.serialize_number(ty, target),
            ConfigType::String(ty) => serializer.serialize_string(ty, target),
            ConfigType::Enum(ty) => serializer.serialize_enum(ty, target),
            ConfigType::List(ty) => serializer.serialize_list(ty, target),
            ConfigType::Map(ty) => serializer.serialize_map(ty, target),
            ConfigType::Record(ty) => serializer.serialize_record(ty, target),
        }
    }
}

// =============================================================================
// Number helpers shared by the formats
// =============================================================================

/// Parse decimal text, accepting exponent notation
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Lossless native forms of a decimal, preferred in this order
pub(crate) enum NativeNumber {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// No native form keeps the exact value
    Text(String),
}

pub(crate) fn native_number(value: Decimal) -> NativeNumber {
    let value = value.normalize();
    if value.scale() == 0 {
        if let Some(i) = value.to_i64() {
            return NativeNumber::Integer(i);
        }
        if let Some(u) = value.to_u64() {
            return NativeNumber::Unsigned(u);
        }
    }
    match value.to_f64() {
        Some(f) if f.is_finite() && parse_decimal(&f.to_string()) == Some(value) => {
            NativeNumber::Float(f)
        }
        _ => NativeNumber::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_native_number_prefers_exact_forms() {
        assert!(matches!(native_number(dec!(42.000)), NativeNumber::Integer(42)));
        assert!(matches!(native_number(dec!(0.5)), NativeNumber::Float(f) if f == 0.5));
        assert!(matches!(
            native_number(dec!(12345678901234567890.123456789)),
            NativeNumber::Text(_)
        ));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1.25"), Some(dec!(1.25)));
        assert_eq!(parse_decimal("1e3"), Some(dec!(1000)));
        assert_eq!(parse_decimal("abc"), None);
    }
}
