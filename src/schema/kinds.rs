//! The closed set of configuration type kinds and their acceptance rules

use crate::error::{Error, Result};
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;

use super::ConfigValue;

// =============================================================================
// ConfigType
// =============================================================================

/// Immutable descriptor of a constrained platform value category.
///
/// Every kind owns its own constraint semantics; composite kinds delegate to
/// their element, value or field types. Acceptance is pure.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigType {
    Boolean(BooleanConfigType),
    Decimal(DecimalConfigType),
    String(StringConfigType),
    Enum(EnumConfigType),
    List(ListConfigType),
    Map(MapConfigType),
    Record(RecordConfigType),
}

impl ConfigType {
    /// Check whether `value` belongs to this type
    #[must_use]
    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match self {
            ConfigType::Boolean(t) => t.accepts(value),
            ConfigType::Decimal(t) => t.accepts(value),
            ConfigType::String(t) => t.accepts(value),
            ConfigType::Enum(t) => t.accepts(value),
            ConfigType::List(t) => t.accepts(value),
            ConfigType::Map(t) => t.accepts(value),
            ConfigType::Record(t) => t.accepts(value),
        }
    }

    /// Kind tag, as written by schema export
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigType::Boolean(_) => "boolean",
            ConfigType::Decimal(_) => "number",
            ConfigType::String(_) => "string",
            ConfigType::Enum(_) => "enum",
            ConfigType::List(_) => "list",
            ConfigType::Map(_) => "map",
            ConfigType::Record(_) => "record",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigType::Boolean(t) => t.fmt(f),
            ConfigType::Decimal(t) => t.fmt(f),
            ConfigType::String(t) => t.fmt(f),
            ConfigType::Enum(t) => t.fmt(f),
            ConfigType::List(t) => t.fmt(f),
            ConfigType::Map(t) => t.fmt(f),
            ConfigType::Record(t) => t.fmt(f),
        }
    }
}

macro_rules! config_type_from {
    ($($variant:ident => $kind:ty),* $(,)?) => {
        $(
            impl From<$kind> for ConfigType {
                fn from(kind: $kind) -> Self {
                    ConfigType::$variant(kind)
                }
            }
        )*
    };
}

config_type_from! {
    Boolean => BooleanConfigType,
    Decimal => DecimalConfigType,
    String => StringConfigType,
    Enum => EnumConfigType,
    List => ListConfigType,
    Map => MapConfigType,
    Record => RecordConfigType,
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidType(reason.into())
}

fn size_in_bounds(len: usize, min: usize, max: Option<usize>) -> bool {
    len >= min && max.is_none_or(|max| len <= max)
}

fn check_size_bounds(what: &str, min: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if min > max => Err(invalid(format!(
            "minimum {what} ({min}) cannot be greater than maximum {what} ({max})"
        ))),
        _ => Ok(()),
    }
}

fn fmt_size_bounds(f: &mut fmt::Formatter<'_>, what: &str, min: usize, max: Option<usize>) -> fmt::Result {
    match (min, max) {
        (0, None) => Ok(()),
        (min, None) => write!(f, " {what} >= {min}"),
        (min, Some(max)) if min == max => write!(f, " {what} {min}"),
        (min, Some(max)) => write!(f, " {what} [{min}, {max}]"),
    }
}

fn narrow_min(what: &str, current: usize, new: usize) -> Result<usize> {
    if new < current {
        return Err(invalid(format!(
            "cannot widen minimum {what} from {current} to {new}"
        )));
    }
    Ok(new)
}

fn narrow_max(what: &str, current: Option<usize>, new: usize) -> Result<Option<usize>> {
    match current {
        Some(current) if new > current => Err(invalid(format!(
            "cannot widen maximum {what} from {current} to {new}"
        ))),
        _ => Ok(Some(new)),
    }
}

// =============================================================================
// Boolean
// =============================================================================

/// `true` or `false`, unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanConfigType;

impl BooleanConfigType {
    pub fn accepts(&self, value: &ConfigValue) -> bool {
        matches!(value, ConfigValue::Boolean(_))
    }
}

impl fmt::Display for BooleanConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("boolean")
    }
}

// =============================================================================
// Decimal
// =============================================================================

/// Exact decimal number with optional bounds and increment.
///
/// Accepted values lie on a lattice `origin + k * increment`. A type built
/// with [`new`](Self::new) takes its minimum as the origin, or zero when it has
/// none: with `minimum = 1` and `increment = 2` the accepted values are
/// `1, 3, 5, ...`. Integer presets use zero as their origin, so
/// `types::integer().with_increment(5)` accepts `0, 5, 10, ...`. Once a type
/// has an increment, narrowing keeps its origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConfigType {
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
    increment: Option<Decimal>,
    origin: Decimal,
}

fn on_lattice(value: Decimal, origin: Decimal, increment: Decimal) -> bool {
    value
        .checked_sub(origin)
        .and_then(|offset| offset.checked_rem(increment))
        .is_some_and(|rem| rem.is_zero())
}

impl PartialEq for DecimalConfigType {
    fn eq(&self, other: &Self) -> bool {
        self.minimum == other.minimum
            && self.maximum == other.maximum
            && self.increment == other.increment
            && self
                .increment
                .is_none_or(|increment| on_lattice(self.origin, other.origin, increment))
    }
}

impl Eq for DecimalConfigType {}

impl DecimalConfigType {
    /// Any decimal number
    pub const UNBOUNDED: Self = Self {
        minimum: None,
        maximum: None,
        increment: None,
        origin: Decimal::ZERO,
    };

    /// Any whole number
    pub const WHOLE: Self = Self {
        minimum: None,
        maximum: None,
        increment: Some(Decimal::ONE),
        origin: Decimal::ZERO,
    };

    /// Create a number type, validating the constraints
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if `minimum > maximum` or the increment is not positive.
    pub fn new(
        minimum: Option<Decimal>,
        maximum: Option<Decimal>,
        increment: Option<Decimal>,
    ) -> Result<Self> {
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(invalid(format!(
                    "min ({min}) cannot be greater than max ({max})"
                )));
            }
        }
        if let Some(increment) = increment {
            if increment <= Decimal::ZERO {
                return Err(invalid(format!(
                    "increment must be positive, got {increment}"
                )));
            }
        }
        Ok(Self {
            minimum,
            maximum,
            increment,
            origin: minimum.unwrap_or(Decimal::ZERO),
        })
    }

    /// Whole numbers in `[minimum, maximum]`, stepped from zero; callers guarantee `minimum <= maximum`
    pub(crate) fn integral(minimum: Decimal, maximum: Decimal) -> Self {
        Self {
            minimum: Some(minimum),
            maximum: Some(maximum),
            increment: Some(Decimal::ONE),
            origin: Decimal::ZERO,
        }
    }

    // Without an increment the origin still follows the minimum
    fn narrowed(
        &self,
        minimum: Option<Decimal>,
        maximum: Option<Decimal>,
        increment: Option<Decimal>,
    ) -> Result<Self> {
        let mut ty = Self::new(minimum, maximum, increment)?;
        if self.increment.is_some() {
            ty.origin = self.origin;
        }
        Ok(ty)
    }

    pub fn minimum(&self) -> Option<Decimal> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<Decimal> {
        self.maximum
    }

    pub fn increment(&self) -> Option<Decimal> {
        self.increment
    }

    /// The value the increment is measured from
    pub fn origin(&self) -> Decimal {
        self.origin
    }

    /// Whether the origin is the one [`new`](Self::new) would pick for these bounds
    pub fn has_implied_origin(&self) -> bool {
        self.increment.is_none_or(|increment| {
            on_lattice(self.origin, self.minimum.unwrap_or(Decimal::ZERO), increment)
        })
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match value {
            ConfigValue::Number(n) => self.accepts_decimal(*n),
            _ => false,
        }
    }

    /// Check bounds and increment for a raw decimal
    pub fn accepts_decimal(&self, value: Decimal) -> bool {
        if self.minimum.is_some_and(|min| value < min) {
            return false;
        }
        if self.maximum.is_some_and(|max| value > max) {
            return false;
        }
        self.increment
            .is_none_or(|increment| on_lattice(value, self.origin, increment))
    }

    /// Raise the minimum. The new minimum must itself be accepted by this type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the result would accept values this type rejects.
    pub fn with_minimum(&self, minimum: Decimal) -> Result<Self> {
        if !self.accepts_decimal(minimum) {
            return Err(invalid(format!(
                "minimum {minimum} is not an accepted value of {self}"
            )));
        }
        self.narrowed(Some(minimum), self.maximum, self.increment)
    }

    /// Lower the maximum. The new maximum must itself be accepted by this type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the result would accept values this type rejects.
    pub fn with_maximum(&self, maximum: Decimal) -> Result<Self> {
        if !self.accepts_decimal(maximum) {
            return Err(invalid(format!(
                "maximum {maximum} is not an accepted value of {self}"
            )));
        }
        self.narrowed(self.minimum, Some(maximum), self.increment)
    }

    /// Coarsen the increment. The new increment must be a multiple of the current one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the increment is not positive or not a multiple.
    pub fn with_increment(&self, increment: Decimal) -> Result<Self> {
        if let Some(current) = self.increment {
            let multiple = increment
                .checked_rem(current)
                .is_some_and(|rem| rem.is_zero());
            if !multiple {
                return Err(invalid(format!(
                    "increment {increment} is not a multiple of {current}"
                )));
            }
        }
        self.narrowed(self.minimum, self.maximum, Some(increment))
    }
}

impl fmt::Display for DecimalConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("number")?;
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) => write!(f, " [{min}, {max}]")?,
            (Some(min), None) => write!(f, " >= {min}")?,
            (None, Some(max)) => write!(f, " <= {max}")?,
            (None, None) => {}
        }
        if let Some(increment) = self.increment {
            write!(f, " step {increment}")?;
            if !self.has_implied_origin() {
                write!(f, " from {}", self.origin)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// String
// =============================================================================

/// A compiled regular expression that must match a whole string
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source`; matching is anchored at both ends
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the expression does not compile.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        if source.is_empty() {
            return Err(invalid("pattern cannot be an empty string"));
        }
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| Error::InvalidPattern {
            pattern: source.clone(),
            source: e,
        })?;
        Ok(Self { source, regex })
    }

    /// The expression as written by the schema author
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Text with optional length bounds (in characters) and pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringConfigType {
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
}

impl StringConfigType {
    /// Any string
    pub const DEFAULT: Self = Self {
        min_length: 0,
        max_length: None,
        pattern: None,
    };

    /// Create a string type with length bounds and an optional pattern
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] for inverted bounds and
    /// [`Error::InvalidPattern`] for a pattern that does not compile.
    pub fn new(min_length: usize, max_length: Option<usize>, pattern: Option<&str>) -> Result<Self> {
        check_size_bounds("length", min_length, max_length)?;
        let pattern = pattern.map(Pattern::new).transpose()?;
        Ok(Self {
            min_length,
            max_length,
            pattern,
        })
    }

    /// Strings of exactly `length` characters
    pub(crate) const fn exact_length(length: usize) -> Self {
        Self {
            min_length: length,
            max_length: Some(length),
            pattern: None,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match value {
            ConfigValue::String(s) => self.accepts_str(s),
            _ => false,
        }
    }

    pub fn accepts_str(&self, value: &str) -> bool {
        size_in_bounds(value.chars().count(), self.min_length, self.max_length)
            && self.pattern.as_ref().is_none_or(|p| p.matches(value))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_min_length(&self, min_length: usize) -> Result<Self> {
        let min_length = narrow_min("length", self.min_length, min_length)?;
        check_size_bounds("length", min_length, self.max_length)?;
        Ok(Self {
            min_length,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_max_length(&self, max_length: usize) -> Result<Self> {
        let max_length = narrow_max("length", self.max_length, max_length)?;
        check_size_bounds("length", self.min_length, max_length)?;
        Ok(Self {
            max_length,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if a pattern is already set, or
    /// [`Error::InvalidPattern`] if it does not compile.
    pub fn with_pattern(&self, pattern: &str) -> Result<Self> {
        if let Some(existing) = &self.pattern {
            return Err(invalid(format!(
                "type already constrained by pattern /{}/",
                existing.as_str()
            )));
        }
        Ok(Self {
            pattern: Some(Pattern::new(pattern)?),
            ..self.clone()
        })
    }
}

impl fmt::Display for StringConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("string")?;
        fmt_size_bounds(f, "length", self.min_length, self.max_length)?;
        if let Some(pattern) = &self.pattern {
            write!(f, " /{}/", pattern.as_str())?;
        }
        Ok(())
    }
}

// =============================================================================
// Enum
// =============================================================================

/// One of a fixed set of names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConfigType {
    values: Vec<String>,
}

impl EnumConfigType {
    /// Create an enum type. Duplicate names are collapsed, order is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if no valid value is given.
    pub fn new<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(invalid("enum type must have at least one valid value"));
        }
        Ok(Self { values: unique })
    }

    /// Valid names in declaration order
    pub fn valid_values(&self) -> &[String] {
        &self.values
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match value {
            ConfigValue::String(s) => self.values.iter().any(|v| v == s),
            _ => false,
        }
    }
}

impl fmt::Display for EnumConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enum {{{}}}", self.values.join(", "))
    }
}

// =============================================================================
// List
// =============================================================================

/// Ordered sequence of values of one element type
#[derive(Debug, Clone, PartialEq)]
pub struct ListConfigType {
    element_type: Box<ConfigType>,
    min_size: usize,
    max_size: Option<usize>,
    unique_elements: bool,
}

impl ListConfigType {
    /// Any number of elements, duplicates allowed
    pub fn of(element_type: impl Into<ConfigType>) -> Self {
        Self {
            element_type: Box::new(element_type.into()),
            min_size: 0,
            max_size: None,
            unique_elements: false,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if `min_size > max_size`.
    pub fn new(
        element_type: impl Into<ConfigType>,
        min_size: usize,
        max_size: Option<usize>,
        unique_elements: bool,
    ) -> Result<Self> {
        check_size_bounds("size", min_size, max_size)?;
        Ok(Self {
            element_type: Box::new(element_type.into()),
            min_size,
            max_size,
            unique_elements,
        })
    }

    pub fn element_type(&self) -> &ConfigType {
        &self.element_type
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn has_unique_elements(&self) -> bool {
        self.unique_elements
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        let ConfigValue::List(items) = value else {
            return false;
        };
        if !size_in_bounds(items.len(), self.min_size, self.max_size) {
            return false;
        }
        if !items.iter().all(|item| self.element_type.accepts(item)) {
            return false;
        }
        !self.unique_elements || all_distinct(items)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_min_size(&self, min_size: usize) -> Result<Self> {
        let min_size = narrow_min("size", self.min_size, min_size)?;
        check_size_bounds("size", min_size, self.max_size)?;
        Ok(Self {
            min_size,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_max_size(&self, max_size: usize) -> Result<Self> {
        let max_size = narrow_max("size", self.max_size, max_size)?;
        check_size_bounds("size", self.min_size, max_size)?;
        Ok(Self {
            max_size,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn with_unique_elements(&self) -> Self {
        Self {
            unique_elements: true,
            ..self.clone()
        }
    }
}

fn all_distinct(items: &[ConfigValue]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, item)| !items[..i].contains(item))
}

impl fmt::Display for ListConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list<{}>", self.element_type)?;
        fmt_size_bounds(f, "size", self.min_size, self.max_size)?;
        if self.unique_elements {
            f.write_str(" unique")?;
        }
        Ok(())
    }
}

// =============================================================================
// Map
// =============================================================================

/// String-keyed mapping to values of one value type
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfigType {
    value_type: Box<ConfigType>,
    min_size: usize,
    max_size: Option<usize>,
}

impl MapConfigType {
    /// Any number of entries
    pub fn of(value_type: impl Into<ConfigType>) -> Self {
        Self {
            value_type: Box::new(value_type.into()),
            min_size: 0,
            max_size: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if `min_size > max_size`.
    pub fn new(value_type: impl Into<ConfigType>, min_size: usize, max_size: Option<usize>) -> Result<Self> {
        check_size_bounds("size", min_size, max_size)?;
        Ok(Self {
            value_type: Box::new(value_type.into()),
            min_size,
            max_size,
        })
    }

    pub fn value_type(&self) -> &ConfigType {
        &self.value_type
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        let ConfigValue::Map(map) = value else {
            return false;
        };
        size_in_bounds(map.len(), self.min_size, self.max_size)
            && map.values().all(|v| self.value_type.accepts(v))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_min_size(&self, min_size: usize) -> Result<Self> {
        let min_size = narrow_min("size", self.min_size, min_size)?;
        check_size_bounds("size", min_size, self.max_size)?;
        Ok(Self {
            min_size,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] when widening or inverting the bounds.
    pub fn with_max_size(&self, max_size: usize) -> Result<Self> {
        let max_size = narrow_max("size", self.max_size, max_size)?;
        check_size_bounds("size", self.min_size, max_size)?;
        Ok(Self {
            max_size,
            ..self.clone()
        })
    }
}

impl fmt::Display for MapConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map<{}>", self.value_type)?;
        fmt_size_bounds(f, "size", self.min_size, self.max_size)
    }
}

// =============================================================================
// Record
// =============================================================================

/// Fixed set of named fields, each with its own type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordConfigType {
    fields: Vec<(String, ConfigType)>,
}

impl RecordConfigType {
    /// Create a record type; fields keep their declaration order
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if two fields share a name.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ConfigType)>,
        S: Into<String>,
    {
        let mut declared: Vec<(String, ConfigType)> = Vec::new();
        for (name, ty) in fields {
            let name = name.into();
            if declared.iter().any(|(existing, _)| *existing == name) {
                return Err(invalid(format!("record field '{name}' is declared twice")));
            }
            declared.push((name, ty));
        }
        Ok(Self { fields: declared })
    }

    /// Declared fields in order
    pub fn fields(&self) -> &[(String, ConfigType)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ConfigType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        let ConfigValue::Map(map) = value else {
            return false;
        };
        self.fields
            .iter()
            .all(|(name, ty)| map.get(name).is_some_and(|v| ty.accepts(v)))
    }
}

impl fmt::Display for RecordConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("record {")?;
        for (i, (name, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {ty}")?;
        }
        f.write_str("}")
    }
}

// =============================================================================
// Tests
// =============================================================================
