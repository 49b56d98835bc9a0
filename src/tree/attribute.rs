use crate::error::{DecodeError, Error, Result};
use crate::schema::{ConfigType, ConfigValue, DerivedType, TypeKind};

use super::FiberId;

/// Typed metadata attached to a node, such as a display hint or a
/// permission level, keyed by a [`FiberId`].
///
/// The stored value always satisfies the attribute's type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigAttribute {
    id: FiberId,
    ty: ConfigType,
    value: ConfigValue,
}

impl ConfigAttribute {
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttribute`] if `value` is rejected by `ty`.
    pub fn new(id: FiberId, ty: impl Into<ConfigType>, value: ConfigValue) -> Result<Self> {
        let ty = ty.into();
        if !ty.accepts(&value) {
            return Err(Error::InvalidAttribute {
                id: id.to_string(),
                reason: format!("value {value} does not satisfy {ty}"),
            });
        }
        Ok(Self { id, ty, value })
    }

    /// Create an attribute from a runtime value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttribute`] if the converted value is rejected.
    pub fn of<R: 'static, K: TypeKind>(id: FiberId, ty: &DerivedType<R, K>, value: &R) -> Result<Self> {
        Self::new(id, ty.serialized_type(), ty.to_serialized(value))
    }

    pub fn id(&self) -> &FiberId {
        &self.id
    }

    pub fn config_type(&self) -> &ConfigType {
        &self.ty
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    /// Read the value through a derived type
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the derived type cannot represent the stored value.
    pub fn value_as<R: 'static, K: TypeKind>(
        &self,
        ty: &DerivedType<R, K>,
    ) -> std::result::Result<R, DecodeError> {
        ty.to_runtime(&self.value)
            .map_err(|e| e.within(self.id.to_string()))
    }

    /// Replace the value. Returns `false` and keeps the old value if the
    /// attribute's type rejects the new one.
    pub fn set_value(&mut self, value: ConfigValue) -> bool {
        if !self.ty.accepts(&value) {
            return false;
        }
        self.value = value;
        true
    }
}
