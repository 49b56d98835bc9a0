use crate::error::{DecodeError, Error, Result};
use crate::schema::{ConfigType, ConfigValue, DerivedType, TypeKind};
use log::warn;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::node::{NodeBase, node_accessors};

/// Callback fired after a leaf's value changes, with the previous value (if
/// any) and the new one
pub type ValueListener = Box<dyn Fn(Option<&ConfigValue>, &ConfigValue)>;

// =============================================================================
// Property
// =============================================================================

/// Something holding a single value that can be read and replaced.
///
/// Implementors never store a value their type rejects: [`set_value`]
/// returns `false` and leaves the current value untouched instead.
///
/// [`set_value`]: Property::set_value
pub trait Property {
    type Value;

    /// Current value; `None` for a leaf built without a default and never set
    fn value(&self) -> Option<Self::Value>;

    /// Store `value` if accepted; returns whether it was stored
    fn set_value(&self, value: Self::Value) -> bool;

    fn accepts(&self, value: &Self::Value) -> bool;
}

// =============================================================================
// ConfigLeaf
// =============================================================================

/// Terminal node holding one constrained value
pub struct ConfigLeaf {
    base: NodeBase,
    ty: ConfigType,
    value: RefCell<Option<ConfigValue>>,
    default: Option<ConfigValue>,
    listeners: Vec<ValueListener>,
}

impl ConfigLeaf {
    /// The default, if any, has already been checked against `ty`
    pub(crate) fn new(
        base: NodeBase,
        ty: ConfigType,
        default: Option<ConfigValue>,
        listeners: Vec<ValueListener>,
    ) -> Self {
        Self {
            base,
            ty,
            value: RefCell::new(default.clone()),
            default,
            listeners,
        }
    }

    pub(crate) fn base(&self) -> &NodeBase {
        &self.base
    }

    node_accessors!();

    pub fn config_type(&self) -> &ConfigType {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&ConfigValue> {
        self.default.as_ref()
    }

    pub fn value(&self) -> Option<ConfigValue> {
        self.value.borrow().clone()
    }

    pub fn has_value(&self) -> bool {
        self.value.borrow().is_some()
    }

    pub fn accepts(&self, value: &ConfigValue) -> bool {
        self.ty.accepts(value)
    }

    /// Store `value` if the leaf's type accepts it, then notify listeners in
    /// registration order. A rejected value changes nothing and notifies no one.
    ///
    /// Listeners may call `set_value` on this leaf again. The nested call
    /// notifies every listener before the outer loop moves on, so later
    /// listeners of the outer call see a stale `current` argument.
    pub fn set_value(&self, value: ConfigValue) -> bool {
        if !self.ty.accepts(&value) {
            return false;
        }
        let previous = self.value.replace(Some(value.clone()));
        for listener in &self.listeners {
            listener(previous.as_ref(), &value);
        }
        true
    }

    /// Restore the default value. Returns `false` if the leaf has no default.
    pub fn reset(&self) -> bool {
        match &self.default {
            Some(default) => self.set_value(default.clone()),
            None => false,
        }
    }

    /// Typed view of this leaf through a derived type over the same serialized type
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `ty` describes a different serialized type.
    pub fn mirror<R: 'static, K: TypeKind>(
        self: &Rc<Self>,
        ty: &DerivedType<R, K>,
    ) -> Result<PropertyMirror<R, K>> {
        PropertyMirror::new(Rc::clone(self), ty.clone())
    }
}

impl Property for ConfigLeaf {
    type Value = ConfigValue;

    fn value(&self) -> Option<ConfigValue> {
        ConfigLeaf::value(self)
    }

    fn set_value(&self, value: ConfigValue) -> bool {
        ConfigLeaf::set_value(self, value)
    }

    fn accepts(&self, value: &ConfigValue) -> bool {
        ConfigLeaf::accepts(self, value)
    }
}

impl fmt::Debug for ConfigLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLeaf")
            .field("name", &self.name())
            .field("type", &self.ty.to_string())
            .field("value", &self.value.borrow())
            .field("default", &self.default)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// PropertyMirror
// =============================================================================

/// Reads and writes a leaf in a runtime representation.
///
/// The mirror holds no state of its own; every read converts the leaf's
/// current value.
pub struct PropertyMirror<R, K = ConfigType> {
    leaf: Rc<ConfigLeaf>,
    ty: DerivedType<R, K>,
}

impl<R: 'static, K: TypeKind> PropertyMirror<R, K> {
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `ty` describes a different serialized type.
    pub fn new(leaf: Rc<ConfigLeaf>, ty: DerivedType<R, K>) -> Result<Self> {
        let serialized = ty.serialized_type();
        if &serialized != leaf.config_type() {
            return Err(Error::TypeMismatch {
                expected: leaf.config_type().to_string(),
                actual: serialized.to_string(),
            });
        }
        Ok(Self { leaf, ty })
    }

    pub fn leaf(&self) -> &Rc<ConfigLeaf> {
        &self.leaf
    }

    pub fn derived_type(&self) -> &DerivedType<R, K> {
        &self.ty
    }

    /// Current value converted to its runtime form
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the conversion fails.
    pub fn try_value(&self) -> std::result::Result<Option<R>, DecodeError> {
        self.leaf
            .value()
            .map(|value| self.ty.to_runtime(&value))
            .transpose()
            .map_err(|e| e.within(self.leaf.path()))
    }
}

impl<R: 'static, K: TypeKind> Property for PropertyMirror<R, K> {
    type Value = R;

    fn value(&self) -> Option<R> {
        match self.try_value() {
            Ok(value) => value,
            Err(e) => {
                warn!("Mirror of '{}' could not convert its value: {e}", self.leaf.path());
                None
            }
        }
    }

    fn set_value(&self, value: R) -> bool {
        self.leaf.set_value(self.ty.to_serialized(&value))
    }

    fn accepts(&self, value: &R) -> bool {
        self.leaf.accepts(&self.ty.to_serialized(value))
    }
}

impl<R, K: fmt::Debug> fmt::Debug for PropertyMirror<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMirror")
            .field("leaf", &self.leaf.name())
            .field("type", &self.ty)
            .finish()
    }
}
