use crate::error::{Error, Result};
use crate::schema::{ConfigType, ConfigValue, DerivedType, TypeKind, types};
use crate::tree::{ConfigNode, ConfigTree, FiberId, NodeCollection};
use log::debug;
use std::rc::Rc;

use super::{ConfigLeafBuilder, NodeSpec};

/// Builds a [`ConfigTree`].
///
/// Children are registered as they are finished, so a name collision is
/// reported by the leaf's `finish_value` (or the subtree's `fork`) rather
/// than when the tree is built.
#[derive(Debug)]
pub struct ConfigTreeBuilder {
    node: NodeSpec,
    items: NodeCollection,
}

impl Default for ConfigTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTreeBuilder {
    /// Builder for a root tree, which has an empty name
    pub fn new() -> Self {
        Self::named("")
    }

    /// Builder for a named tree, to be attached to a parent later
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            node: NodeSpec::new(name),
            items: NodeCollection::detached(),
        }
    }

    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.node.set_name(name);
        self
    }

    pub fn with_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.node.set_comment(comment);
        self
    }

    pub fn with_attribute(
        &mut self,
        id: FiberId,
        ty: impl Into<ConfigType>,
        value: impl Into<ConfigValue>,
    ) -> &mut Self {
        self.node.attribute(id, ty, value.into());
        self
    }

    pub fn with_typed_attribute<A: 'static, K: TypeKind>(
        &mut self,
        id: FiberId,
        ty: &DerivedType<A, K>,
        value: A,
    ) -> &mut Self {
        self.node.typed_attribute(id, ty, &value);
        self
    }

    /// Start a leaf with a default value
    pub fn begin_value<R: 'static, K: TypeKind>(
        &mut self,
        name: impl Into<String>,
        ty: &DerivedType<R, K>,
        default: R,
    ) -> ConfigLeafBuilder<'_, R, K> {
        ConfigLeafBuilder::with_parent(Some(self), name, ty).with_default_value(default)
    }

    /// Start a leaf with no default value
    pub fn begin_leaf<R: 'static, K: TypeKind>(
        &mut self,
        name: impl Into<String>,
        ty: &DerivedType<R, K>,
    ) -> ConfigLeafBuilder<'_, R, K> {
        ConfigLeafBuilder::with_parent(Some(self), name, ty)
    }

    /// Start a leaf typed by a plain [`ConfigType`], holding platform values
    pub fn begin_raw_value(
        &mut self,
        name: impl Into<String>,
        ty: impl Into<ConfigType>,
        default: ConfigValue,
    ) -> ConfigLeafBuilder<'_, ConfigValue, ConfigType> {
        let ty = types::identity(ty);
        ConfigLeafBuilder::with_parent(Some(self), name, &ty).with_default_value(default)
    }

    /// Build a subtree with `define` and register it as a child
    ///
    /// # Errors
    ///
    /// Returns any error from `define` or from building the subtree, or
    /// [`Error::Registration`] if the name is already taken.
    pub fn fork<F>(&mut self, name: impl Into<String>, define: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ConfigTreeBuilder) -> Result<()>,
    {
        let mut sub = ConfigTreeBuilder::named(name);
        define(&mut sub)?;
        let tree = sub.build()?;
        self.register(ConfigNode::Tree(tree))?;
        Ok(self)
    }

    /// Add an already built node
    ///
    /// # Errors
    ///
    /// Same as [`NodeCollection::add`].
    pub fn with_child(&mut self, child: impl Into<ConfigNode>, overwrite: bool) -> Result<&mut Self> {
        self.items.add(child, overwrite)?;
        Ok(self)
    }

    pub(crate) fn register(&mut self, child: ConfigNode) -> Result<()> {
        let name = child.name().to_string();
        self.items.add(child, false).map_err(|e| Error::Registration {
            name,
            source: Box::new(e),
        })
    }

    /// # Errors
    ///
    /// Returns the first mistake recorded while chaining, such as a
    /// duplicate attribute.
    pub fn build(self) -> Result<Rc<ConfigTree>> {
        let base = self.node.into_base()?;
        let tree = ConfigTree::new(base, self.items);
        debug!(
            "Built tree '{}' with {} children",
            tree.name(),
            tree.items().len()
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumConfigType, ListConfigType};

    #[test]
    fn test_sibling_collision_is_registration_error() {
        let mut builder = ConfigTreeBuilder::new();
        builder
            .begin_value("fov", &types::integer(), 90)
            .finish_value()
            .unwrap();
        let err = builder
            .begin_value("fov", &types::integer(), 70)
            .finish_value()
            .unwrap_err();

        assert!(matches!(err, Error::Registration { .. }));
        assert!(err.is_duplicate_child());

        let root = builder.build().unwrap();
        assert_eq!(
            root.lookup_leaf("fov").unwrap().value(),
            Some(ConfigValue::from(90))
        );
    }

    #[test]
    fn test_fork_collision() {
        let mut builder = ConfigTreeBuilder::new();
        builder.fork("a", |_| Ok(())).unwrap();
        let err = builder.fork("a", |_| Ok(())).unwrap_err();
        assert!(err.is_duplicate_child());
    }

    #[test]
    fn test_names_must_be_path_segments() {
        let mut builder = ConfigTreeBuilder::new();
        let err = builder.fork("", |_| Ok(())).unwrap_err();
        assert!(err.is_build_error());

        let err = builder
            .begin_value("video.fov", &types::integer(), 90)
            .finish_value()
            .unwrap_err();
        let Error::Registration { source, .. } = &err else {
            panic!("expected a registration error, got {err:?}");
        };
        assert!(matches!(**source, Error::InvalidName { .. }));

        let dotted = ConfigTreeBuilder::named("a.b").build().unwrap();
        assert!(matches!(
            builder.with_child(dotted, true),
            Err(Error::InvalidName { .. })
        ));
        assert!(builder.build().unwrap().items().is_empty());
    }

    #[test]
    fn test_finish_value_with_sees_leaf() {
        let mut builder = ConfigTreeBuilder::new();
        let mut captured = None;
        builder
            .begin_value("enabled", &types::boolean(), true)
            .finish_value_with(|leaf| captured = Some(Rc::clone(leaf)))
            .unwrap();
        let root = builder.build().unwrap();

        let captured = captured.unwrap();
        assert!(Rc::ptr_eq(&captured, &root.lookup_leaf("enabled").unwrap()));
        assert!(Rc::ptr_eq(&captured.parent().unwrap(), &root));
    }

    #[test]
    fn test_raw_enum_list_value() {
        let colors = EnumConfigType::new(["RED", "GREEN", "BLUE"]).unwrap();
        let mut builder = ConfigTreeBuilder::new();
        builder
            .begin_raw_value(
                "palette",
                ListConfigType::of(colors),
                ConfigValue::from(vec!["RED", "BLUE"]),
            )
            .finish_value()
            .unwrap();
        let root = builder.build().unwrap();
        let palette = root.lookup_leaf("palette").unwrap();

        assert!(!palette.set_value(ConfigValue::from(vec!["PURPLE"])));
        assert_eq!(palette.value(), Some(ConfigValue::from(vec!["RED", "BLUE"])));
    }

    #[test]
    fn test_with_child_adopts_built_node() {
        let leaf = ConfigLeafBuilder::new("loose", &types::boolean())
            .with_default_value(false)
            .build()
            .unwrap();
        let mut builder = ConfigTreeBuilder::named("section");
        builder.with_child(Rc::clone(&leaf), false).unwrap();
        let tree = builder.build().unwrap();

        assert_eq!(tree.name(), "section");
        assert!(Rc::ptr_eq(&leaf.parent().unwrap(), &tree));
    }
}
