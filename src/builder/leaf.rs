use crate::error::{Error, Result};
use crate::schema::{ConfigType, ConfigValue, DerivedType, TypeKind};
use crate::tree::{ConfigLeaf, ConfigNode, FiberId, ValueListener};
use log::{debug, warn};
use std::rc::Rc;

use super::{ConfigTreeBuilder, NodeSpec};

/// Builds a [`ConfigLeaf`] holding values of a derived type.
///
/// A leaf builder obtained from [`ConfigTreeBuilder::begin_value`] registers
/// the leaf with that tree builder when built; one created with
/// [`ConfigLeafBuilder::new`] produces a free-standing leaf.
pub struct ConfigLeafBuilder<'a, R, K = ConfigType> {
    parent: Option<&'a mut ConfigTreeBuilder>,
    node: NodeSpec,
    ty: DerivedType<R, K>,
    default: Option<ConfigValue>,
    listeners: Vec<ValueListener>,
}

impl<R: 'static, K: TypeKind> ConfigLeafBuilder<'static, R, K> {
    /// Builder for a leaf that belongs to no tree
    pub fn new(name: impl Into<String>, ty: &DerivedType<R, K>) -> Self {
        Self::with_parent(None, name, ty)
    }
}

impl<'a, R: 'static, K: TypeKind> ConfigLeafBuilder<'a, R, K> {
    pub(crate) fn with_parent(
        parent: Option<&'a mut ConfigTreeBuilder>,
        name: impl Into<String>,
        ty: &DerivedType<R, K>,
    ) -> Self {
        Self {
            parent,
            node: NodeSpec::new(name),
            ty: ty.clone(),
            default: None,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.node.set_name(name);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.node.set_comment(comment);
        self
    }

    /// Attach an attribute with a platform value; a second attribute with
    /// the same id makes [`build`](Self::build) fail
    #[must_use]
    pub fn with_attribute(mut self, id: FiberId, ty: impl Into<ConfigType>, value: impl Into<ConfigValue>) -> Self {
        self.node.attribute(id, ty, value.into());
        self
    }

    /// Attach an attribute with a runtime value
    #[must_use]
    pub fn with_typed_attribute<A: 'static, AK: TypeKind>(
        mut self,
        id: FiberId,
        ty: &DerivedType<A, AK>,
        value: A,
    ) -> Self {
        self.node.typed_attribute(id, ty, &value);
        self
    }

    /// Initial value, restored by [`ConfigLeaf::reset`]
    #[must_use]
    pub fn with_default_value(mut self, value: R) -> Self {
        self.default = Some(self.ty.to_serialized(&value));
        self
    }

    /// Listen for changes in runtime form.
    ///
    /// Values the derived type cannot convert are logged and the listener
    /// is skipped for that change.
    #[must_use]
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(Option<&R>, &R) + 'static,
    {
        let ty = self.ty.clone();
        self.listeners.push(Box::new(move |previous, current| {
            let current = match ty.to_runtime(current) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Skipping listener, new value has no runtime form: {e}");
                    return;
                }
            };
            let previous = previous.and_then(|value| ty.to_runtime(value).ok());
            listener(previous.as_ref(), &current);
        }));
        self
    }

    /// Listen for changes in serialized form
    #[must_use]
    pub fn with_raw_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(Option<&ConfigValue>, &ConfigValue) + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }

    fn build_parts(self) -> Result<(Rc<ConfigLeaf>, Option<&'a mut ConfigTreeBuilder>)> {
        if self.node.name().is_empty() {
            return Err(Error::BuilderMisuse("a leaf needs a non-empty name".into()));
        }
        if let Some(default) = &self.default {
            if !self.ty.kind().accepts(default) {
                return Err(Error::InvalidDefault {
                    name: self.node.name().to_string(),
                    value: default.to_string(),
                    ty: self.ty.kind().to_string(),
                });
            }
        }
        let base = self.node.into_base()?;
        let leaf = Rc::new(ConfigLeaf::new(
            base,
            self.ty.serialized_type(),
            self.default,
            self.listeners,
        ));
        debug!("Built leaf '{}' of type {}", leaf.name(), leaf.config_type());

        let parent = match self.parent {
            Some(parent) => {
                parent.register(ConfigNode::Leaf(Rc::clone(&leaf)))?;
                Some(parent)
            }
            None => None,
        };
        Ok((leaf, parent))
    }

    /// Build the leaf, registering it with the parent tree builder if there is one
    ///
    /// # Errors
    ///
    /// Returns an error for an empty name, a default the type rejects, a
    /// duplicate or invalid attribute, or [`Error::Registration`] if the
    /// parent already has a child with this name.
    pub fn build(self) -> Result<Rc<ConfigLeaf>> {
        self.build_parts().map(|(leaf, _)| leaf)
    }

    /// Build the leaf and continue with the parent tree builder
    ///
    /// # Errors
    ///
    /// Returns [`Error::BuilderMisuse`] on a free-standing builder, otherwise
    /// the same errors as [`build`](Self::build).
    pub fn finish_value(self) -> Result<&'a mut ConfigTreeBuilder> {
        self.finish_value_with(|_| {})
    }

    /// Like [`finish_value`](Self::finish_value), handing the built leaf to `action` first
    ///
    /// # Errors
    ///
    /// Same as [`finish_value`](Self::finish_value).
    pub fn finish_value_with<F>(self, action: F) -> Result<&'a mut ConfigTreeBuilder>
    where
        F: FnOnce(&Rc<ConfigLeaf>),
    {
        if self.parent.is_none() {
            return Err(Error::BuilderMisuse(
                "finish_value called on a builder with no parent tree, use build instead".into(),
            ));
        }
        let (leaf, parent) = self.build_parts()?;
        action(&leaf);
        parent.ok_or_else(|| Error::BuilderMisuse("parent tree builder went missing".into()))
    }
}
