//! Ready-made derived types for common runtime representations
//!
//! Integer presets carry the full range of their Rust type with an increment
//! of one counted from zero. Floating point presets are unbounded; values
//! that have no exact decimal form (NaN, infinities, magnitudes past the
//! decimal range) are saturated when converted to their serialized form.

use crate::error::{DecodeError, Result};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    BooleanConfigType, ConfigType, ConfigValue, DecimalConfigType, DerivedType, EnumConfigType,
    ListConfigType, MapConfigType, RecordConfigType, StringConfigType, TypeKind,
};

fn mismatch(value: &ConfigValue, expected: &str) -> DecodeError {
    DecodeError::new(
        value,
        expected,
        format!("expected a {expected} value, found a {}", value.kind_name()),
    )
}

// =============================================================================
// Identity
// =============================================================================

/// Leaves whose runtime form is the platform value itself
pub fn identity(ty: impl Into<ConfigType>) -> DerivedType<ConfigValue, ConfigType> {
    DerivedType::new(ty.into(), |value| Ok(value.clone()), |value| value.clone())
}

// =============================================================================
// Boolean
// =============================================================================

pub fn boolean() -> DerivedType<bool, BooleanConfigType> {
    DerivedType::new(
        BooleanConfigType,
        |value| value.as_bool().ok_or_else(|| mismatch(value, "boolean")),
        |b| ConfigValue::Boolean(*b),
    )
}

// =============================================================================
// Numbers
// =============================================================================

fn decimal_of(value: &ConfigValue, expected: &str) -> std::result::Result<Decimal, DecodeError> {
    value.as_decimal().ok_or_else(|| mismatch(value, expected))
}

/// Any decimal number, kept exact
pub fn unbounded_decimal() -> DerivedType<Decimal, DecimalConfigType> {
    DerivedType::new(
        DecimalConfigType::UNBOUNDED,
        |value| decimal_of(value, "number"),
        |n| ConfigValue::Number(*n),
    )
}

/// Any whole number, kept exact
pub fn unbounded_integer() -> DerivedType<Decimal, DecimalConfigType> {
    DerivedType::new(
        DecimalConfigType::WHOLE,
        |value| decimal_of(value, "integer"),
        |n| ConfigValue::Number(*n),
    )
}

macro_rules! integer_type {
    ($(#[$doc:meta])* $name:ident => $t:ty, $to:ident) => {
        $(#[$doc])*
        pub fn $name() -> DerivedType<$t, DecimalConfigType> {
            DerivedType::new(
                DecimalConfigType::integral(Decimal::from(<$t>::MIN), Decimal::from(<$t>::MAX)),
                |value| {
                    let n = decimal_of(value, stringify!($t))?;
                    if !n.fract().is_zero() {
                        return Err(DecodeError::new(n, stringify!($t), "not a whole number"));
                    }
                    n.$to()
                        .ok_or_else(|| DecodeError::new(n, stringify!($t), "out of range"))
                },
                |n| ConfigValue::Number(Decimal::from(*n)),
            )
        }
    };
}

integer_type!(
    /// `i8`, serialized as a whole number in `[-128, 127]`
    byte => i8, to_i8
);
integer_type!(
    /// `i16`
    short => i16, to_i16
);
integer_type!(
    /// `i32`
    integer => i32, to_i32
);
integer_type!(
    /// `i64`
    long => i64, to_i64
);
integer_type!(
    /// `u8`, serialized as a whole number in `[0, 255]`
    unsigned_byte => u8, to_u8
);
integer_type!(
    /// `u16`
    unsigned_short => u16, to_u16
);
integer_type!(
    /// `u32`
    unsigned_integer => u32, to_u32
);

fn saturating_decimal(value: f64) -> Decimal {
    if let Some(d) = Decimal::from_f64(value) {
        return d;
    }
    let saturated = if value.is_nan() {
        Decimal::ZERO
    } else if value > 0.0 {
        Decimal::MAX
    } else {
        Decimal::MIN
    };
    warn!("Floating point value {value} has no decimal form, stored as {saturated}");
    saturated
}

/// `f32`, unbounded
pub fn float() -> DerivedType<f32, DecimalConfigType> {
    DerivedType::new(
        DecimalConfigType::UNBOUNDED,
        |value| {
            let n = decimal_of(value, "f32")?;
            n.to_f32()
                .ok_or_else(|| DecodeError::new(n, "f32", "out of range"))
        },
        |n| ConfigValue::Number(saturating_decimal(f64::from(*n))),
    )
}

/// `f64`, unbounded
pub fn double() -> DerivedType<f64, DecimalConfigType> {
    DerivedType::new(
        DecimalConfigType::UNBOUNDED,
        |value| {
            let n = decimal_of(value, "f64")?;
            n.to_f64()
                .ok_or_else(|| DecodeError::new(n, "f64", "out of range"))
        },
        |n| ConfigValue::Number(saturating_decimal(*n)),
    )
}

// =============================================================================
// Strings
// =============================================================================

pub fn string() -> DerivedType<String, StringConfigType> {
    DerivedType::new(
        StringConfigType::DEFAULT,
        |value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| mismatch(value, "string"))
        },
        |s| ConfigValue::String(s.clone()),
    )
}

/// A single character, serialized as a one-character string
pub fn character() -> DerivedType<char, StringConfigType> {
    DerivedType::new(
        StringConfigType::exact_length(1),
        |value| {
            let s = value.as_str().ok_or_else(|| mismatch(value, "char"))?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(DecodeError::new(value, "char", "expected exactly one character")),
            }
        },
        |c| ConfigValue::String(c.to_string()),
    )
}

// =============================================================================
// Enums
// =============================================================================

/// A Rust enum usable as a configuration value.
///
/// Values are serialized by [`name`](ConfigEnum::name), which must be unique
/// among [`variants`](ConfigEnum::variants).
///
/// ```
/// use fiberconf::schema::types::ConfigEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color { Red, Blue }
///
/// impl ConfigEnum for Color {
///     fn variants() -> &'static [Self] {
///         &[Color::Red, Color::Blue]
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Color::Red => "RED",
///             Color::Blue => "BLUE",
///         }
///     }
/// }
///
/// let ty = fiberconf::schema::types::make_enum::<Color>().unwrap();
/// assert!(ty.accepts_runtime(&Color::Blue));
/// ```
pub trait ConfigEnum: Sized + Clone + 'static {
    fn variants() -> &'static [Self];
    fn name(&self) -> &'static str;
}

/// # Errors
///
/// Returns [`Error::InvalidType`](crate::Error::InvalidType) if the enum has no variants.
pub fn make_enum<E: ConfigEnum>() -> Result<DerivedType<E, EnumConfigType>> {
    let kind = EnumConfigType::new(E::variants().iter().map(ConfigEnum::name))?;
    Ok(DerivedType::new(
        kind,
        |value| {
            let name = value.as_str().ok_or_else(|| mismatch(value, "enum"))?;
            E::variants()
                .iter()
                .find(|variant| variant.name() == name)
                .cloned()
                .ok_or_else(|| DecodeError::new(value, "enum", "unknown enum value"))
        },
        |variant| ConfigValue::String(variant.name().to_string()),
    ))
}

/// Enum over a set of names with plain strings at runtime
///
/// # Errors
///
/// Returns [`Error::InvalidType`](crate::Error::InvalidType) if no name is given.
pub fn enum_of<I, S>(values: I) -> Result<DerivedType<String, EnumConfigType>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(DerivedType::new(
        EnumConfigType::new(values)?,
        |value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| mismatch(value, "enum"))
        },
        |s| ConfigValue::String(s.clone()),
    ))
}

// =============================================================================
// Collections
// =============================================================================

/// Unconstrained list of `element`, as a `Vec`
pub fn make_list<E, K>(element: &DerivedType<E, K>) -> DerivedType<Vec<E>, ListConfigType>
where
    E: 'static,
    K: TypeKind,
{
    let decode = element.clone();
    let encode = element.clone();
    DerivedType::new(
        ListConfigType::of(element.serialized_type()),
        move |value| {
            let items = value.as_list().ok_or_else(|| mismatch(value, "list"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode.to_runtime(item).map_err(|e| e.at_index(i)))
                .collect()
        },
        move |items: &Vec<E>| ConfigValue::List(items.iter().map(|e| encode.to_serialized(e)).collect()),
    )
}

/// List of `element` with unique elements, as an ordered set
pub fn make_set<E, K>(element: &DerivedType<E, K>) -> DerivedType<BTreeSet<E>, ListConfigType>
where
    E: Ord + Clone + 'static,
    K: TypeKind,
{
    make_list(element)
        .with_unique_elements()
        .derive(
            |items: Vec<E>| Ok(items.into_iter().collect()),
            |set: &BTreeSet<E>| set.iter().cloned().collect(),
        )
}

/// List of `element`, as a boxed slice
pub fn make_array<E, K>(element: &DerivedType<E, K>) -> DerivedType<Box<[E]>, ListConfigType>
where
    E: Clone + 'static,
    K: TypeKind,
{
    make_list(element).derive(|items| Ok(items.into_boxed_slice()), |array| array.to_vec())
}

/// Map with keys converted by `key` and values by `value`.
///
/// Key constraints are applied during conversion only; the serialized map
/// type itself does not restrict its keys.
pub fn make_map<K, V, VK>(
    key: &DerivedType<K, StringConfigType>,
    value: &DerivedType<V, VK>,
) -> DerivedType<BTreeMap<K, V>, MapConfigType>
where
    K: Ord + 'static,
    V: 'static,
    VK: TypeKind,
{
    let (decode_key, encode_key) = (key.clone(), key.clone());
    let (decode_value, encode_value) = (value.clone(), value.clone());
    DerivedType::new(
        MapConfigType::of(value.serialized_type()),
        move |serialized| {
            let entries = serialized.as_map().ok_or_else(|| mismatch(serialized, "map"))?;
            entries
                .iter()
                .map(|(k, v)| -> std::result::Result<(K, V), DecodeError> {
                    let runtime_key = decode_key
                        .to_runtime(&ConfigValue::String(k.clone()))
                        .map_err(|e| e.within(k.as_str()))?;
                    let runtime_value = decode_value.to_runtime(v).map_err(|e| e.within(k.as_str()))?;
                    Ok((runtime_key, runtime_value))
                })
                .collect()
        },
        move |map: &BTreeMap<K, V>| {
            ConfigValue::Map(
                map.iter()
                    .map(|(k, v)| {
                        let key = match encode_key.to_serialized(k) {
                            ConfigValue::String(s) => s,
                            other => other.to_string(),
                        };
                        (key, encode_value.to_serialized(v))
                    })
                    .collect(),
            )
        },
    )
}

/// Record with its fields as a map of platform values
pub fn make_record(record: RecordConfigType) -> DerivedType<BTreeMap<String, ConfigValue>, RecordConfigType> {
    DerivedType::new(
        record,
        |value| value.as_map().cloned().ok_or_else(|| mismatch(value, "record")),
        |fields| ConfigValue::Map(fields.clone()),
    )
}
