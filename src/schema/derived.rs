//! Derived types: a serialized kind paired with a runtime representation

use crate::error::{DecodeError, Error, Result};
use crate::serialization::ValueSerializer;
use std::fmt;
use std::rc::Rc;

use super::{
    BooleanConfigType, ConfigType, ConfigValue, DecimalConfigType, EnumConfigType,
    ListConfigType, MapConfigType, RecordConfigType, StringConfigType,
};

// =============================================================================
// TypeKind
// =============================================================================

/// A serialized type a [`DerivedType`] can be built over.
///
/// Implemented by every kind struct and by the erased [`ConfigType`], so
/// derived types can keep kind-specific narrowing methods available.
pub trait TypeKind: Clone + fmt::Debug + fmt::Display + 'static {
    fn accepts(&self, value: &ConfigValue) -> bool;

    /// The kind as a [`ConfigType`]
    fn erase(&self) -> ConfigType;
}

impl TypeKind for ConfigType {
    fn accepts(&self, value: &ConfigValue) -> bool {
        ConfigType::accepts(self, value)
    }

    fn erase(&self) -> ConfigType {
        self.clone()
    }
}

macro_rules! type_kind {
    ($($kind:ty),* $(,)?) => {
        $(
            impl TypeKind for $kind {
                fn accepts(&self, value: &ConfigValue) -> bool {
                    <$kind>::accepts(self, value)
                }

                fn erase(&self) -> ConfigType {
                    ConfigType::from(self.clone())
                }
            }
        )*
    };
}

type_kind!(
    BooleanConfigType,
    DecimalConfigType,
    StringConfigType,
    EnumConfigType,
    ListConfigType,
    MapConfigType,
    RecordConfigType,
);

// =============================================================================
// DerivedType
// =============================================================================

type ToRuntime<R> = dyn Fn(&ConfigValue) -> std::result::Result<R, DecodeError>;
type ToSerialized<R> = dyn Fn(&R) -> ConfigValue;

/// Bidirectional converter between a serialized kind `K` and a runtime type `R`.
///
/// `to_serialized` is total and must always produce a value accepted by the
/// kind. `to_runtime` is only guaranteed to succeed for values the kind
/// accepts; anything else is reported as a [`DecodeError`] instead of being
/// coerced. Conversions are shared, so cloning a derived type is cheap.
pub struct DerivedType<R, K = ConfigType> {
    kind: K,
    to_runtime: Rc<ToRuntime<R>>,
    to_serialized: Rc<ToSerialized<R>>,
}

impl<R, K: Clone> Clone for DerivedType<R, K> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            to_runtime: Rc::clone(&self.to_runtime),
            to_serialized: Rc::clone(&self.to_serialized),
        }
    }
}

impl<R, K: fmt::Debug> fmt::Debug for DerivedType<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedType")
            .field("kind", &self.kind)
            .field("runtime", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R: 'static, K: TypeKind> DerivedType<R, K> {
    pub fn new<F, G>(kind: K, to_runtime: F, to_serialized: G) -> Self
    where
        F: Fn(&ConfigValue) -> std::result::Result<R, DecodeError> + 'static,
        G: Fn(&R) -> ConfigValue + 'static,
    {
        Self {
            kind,
            to_runtime: Rc::new(to_runtime),
            to_serialized: Rc::new(to_serialized),
        }
    }

    /// The serialized kind with its constraints
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// The serialized kind, erased to a [`ConfigType`]
    pub fn serialized_type(&self) -> ConfigType {
        self.kind.erase()
    }

    /// Convert a serialized value to its runtime form
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the value does not have the shape this type expects.
    pub fn to_runtime(&self, value: &ConfigValue) -> std::result::Result<R, DecodeError> {
        (self.to_runtime)(value)
    }

    /// Convert a runtime value to its serialized form
    pub fn to_serialized(&self, value: &R) -> ConfigValue {
        (self.to_serialized)(value)
    }

    /// Check whether the serialized form of `value` satisfies the kind's constraints
    pub fn accepts_runtime(&self, value: &R) -> bool {
        self.kind.accepts(&self.to_serialized(value))
    }

    /// Build a new derived type over the same serialized kind.
    ///
    /// `to_runtime` runs after this type's own conversion and may reject
    /// values; `to_serialized` maps back into this type's runtime form.
    pub fn derive<R2, F, G>(&self, to_runtime: F, to_serialized: G) -> DerivedType<R2, K>
    where
        R2: 'static,
        F: Fn(R) -> std::result::Result<R2, DecodeError> + 'static,
        G: Fn(&R2) -> R + 'static,
    {
        let outer = self.clone();
        let inner = self.clone();
        DerivedType::new(
            self.kind.clone(),
            move |value| outer.to_runtime(value).and_then(&to_runtime),
            move |value| inner.to_serialized(&to_serialized(value)),
        )
    }

    /// Same conversions over a (narrower) kind
    fn with_kind(&self, kind: K) -> Self {
        Self {
            kind,
            to_runtime: Rc::clone(&self.to_runtime),
            to_serialized: Rc::clone(&self.to_serialized),
        }
    }

    /// Decode an element, check the constraints, then convert to runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the element cannot be decoded, the decoded
    /// value is rejected by the constraints, or the runtime conversion fails.
    pub fn decode<S: ValueSerializer>(
        &self,
        element: &S::Element,
        serializer: &S,
    ) -> std::result::Result<R, DecodeError> {
        let ty = self.kind.erase();
        let value = ty.deserialize_value(element, serializer)?;
        if !self.kind.accepts(&value) {
            return Err(DecodeError::new(
                &value,
                ty.to_string(),
                "value does not satisfy type constraints",
            ));
        }
        self.to_runtime(&value)
    }

    /// Convert to serialized form and encode it
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the conversion produced a value of the wrong shape.
    pub fn encode<S: ValueSerializer>(&self, value: &R, serializer: &S) -> Result<S::Element> {
        self.kind
            .erase()
            .serialize_value(&self.to_serialized(value), serializer)
    }
}

// =============================================================================
// Kind-specific narrowing
// =============================================================================

impl<R: 'static> DerivedType<R, DecimalConfigType> {
    fn decimal_of(&self, value: &R) -> Result<rust_decimal::Decimal> {
        match self.to_serialized(value) {
            ConfigValue::Number(n) => Ok(n),
            other => Err(Error::TypeMismatch {
                expected: "number".into(),
                actual: other.kind_name().into(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_minimum(&self, minimum: R) -> Result<Self> {
        let minimum = self.decimal_of(&minimum)?;
        Ok(self.with_kind(self.kind.with_minimum(minimum)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_maximum(&self, maximum: R) -> Result<Self> {
        let maximum = self.decimal_of(&maximum)?;
        Ok(self.with_kind(self.kind.with_maximum(maximum)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the increment is not a multiple of the current one.
    pub fn with_increment(&self, increment: R) -> Result<Self> {
        let increment = self.decimal_of(&increment)?;
        Ok(self.with_kind(self.kind.with_increment(increment)?))
    }
}

impl<R: 'static> DerivedType<R, StringConfigType> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_min_length(&self, min_length: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_min_length(min_length)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_max_length(&self, max_length: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_max_length(max_length)?))
    }

    /// # Errors
    ///
    /// Returns an error if a pattern is already set or the expression is invalid.
    pub fn with_pattern(&self, pattern: &str) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_pattern(pattern)?))
    }
}

impl<R: 'static> DerivedType<R, ListConfigType> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_min_size(&self, min_size: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_min_size(min_size)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_max_size(&self, max_size: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_max_size(max_size)?))
    }

    #[must_use]
    pub fn with_unique_elements(&self) -> Self {
        self.with_kind(self.kind.with_unique_elements())
    }
}

impl<R: 'static> DerivedType<R, MapConfigType> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_min_size(&self, min_size: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_min_size(min_size)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the bound would widen the type.
    pub fn with_max_size(&self, max_size: usize) -> Result<Self> {
        Ok(self.with_kind(self.kind.with_max_size(max_size)?))
    }
}
