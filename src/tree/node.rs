use crate::error::{Error, Result};
use crate::schema::ConfigValue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::{ConfigAttribute, ConfigLeaf, ConfigTree, FiberId};

// =============================================================================
// Parent link
// =============================================================================

#[derive(Debug, Default)]
pub(crate) enum ParentLink {
    #[default]
    Detached,
    /// Held by a builder collection whose tree does not exist yet
    Pending,
    Attached(Weak<ConfigTree>),
}

// =============================================================================
// NodeBase
// =============================================================================

/// State shared by leaves and trees
#[derive(Debug)]
pub(crate) struct NodeBase {
    name: String,
    comment: Option<String>,
    attributes: RefCell<BTreeMap<FiberId, ConfigAttribute>>,
    parent: RefCell<ParentLink>,
}

impl NodeBase {
    pub(crate) fn new(name: String, comment: Option<String>, attributes: Vec<ConfigAttribute>) -> Self {
        Self {
            name,
            comment,
            attributes: RefCell::new(
                attributes
                    .into_iter()
                    .map(|attr| (attr.id().clone(), attr))
                    .collect(),
            ),
            parent: RefCell::new(ParentLink::Detached),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub(crate) fn parent(&self) -> Option<Rc<ConfigTree>> {
        match &*self.parent.borrow() {
            ParentLink::Attached(parent) => parent.upgrade(),
            _ => None,
        }
    }

    /// A node counts as attached while a builder holds it or its tree is alive
    pub(crate) fn is_attached(&self) -> bool {
        match &*self.parent.borrow() {
            ParentLink::Detached => false,
            ParentLink::Pending => true,
            ParentLink::Attached(parent) => parent.strong_count() > 0,
        }
    }

    pub(crate) fn set_parent(&self, link: ParentLink) {
        *self.parent.borrow_mut() = link;
    }

    pub(crate) fn attribute(&self, id: &FiberId) -> Option<ConfigAttribute> {
        self.attributes.borrow().get(id).cloned()
    }

    pub(crate) fn attribute_ids(&self) -> Vec<FiberId> {
        self.attributes.borrow().keys().cloned().collect()
    }

    pub(crate) fn add_attribute(&self, attribute: ConfigAttribute) -> Result<()> {
        let mut attributes = self.attributes.borrow_mut();
        if attributes.contains_key(attribute.id()) {
            return Err(Error::DuplicateAttribute {
                node: self.name.clone(),
                id: attribute.id().to_string(),
            });
        }
        attributes.insert(attribute.id().clone(), attribute);
        Ok(())
    }

    pub(crate) fn set_attribute_value(&self, id: &FiberId, value: ConfigValue) -> bool {
        self.attributes
            .borrow_mut()
            .get_mut(id)
            .is_some_and(|attr| attr.set_value(value))
    }
}

/// Shared accessors for leaves, trees and node handles
macro_rules! node_accessors {
    () => {
        /// Name, unique among siblings. The root of a tree has an empty name.
        pub fn name(&self) -> &str {
            self.base().name()
        }

        pub fn comment(&self) -> Option<&str> {
            self.base().comment()
        }

        /// The tree holding this node, if it is attached to one that is still alive
        pub fn parent(&self) -> Option<std::rc::Rc<$crate::tree::ConfigTree>> {
            self.base().parent()
        }

        /// Dotted path from the outermost ancestor, excluding an unnamed root
        pub fn path(&self) -> String {
            let mut segments = vec![self.name().to_string()];
            let mut current = self.parent();
            while let Some(tree) = current {
                if !tree.name().is_empty() {
                    segments.push(tree.name().to_string());
                }
                current = tree.parent();
            }
            segments.reverse();
            segments.join(".")
        }

        pub fn attribute(&self, id: &$crate::tree::FiberId) -> Option<$crate::tree::ConfigAttribute> {
            self.base().attribute(id)
        }

        /// Identifiers of all attributes, in order
        pub fn attribute_ids(&self) -> Vec<$crate::tree::FiberId> {
            self.base().attribute_ids()
        }

        /// Attach an attribute after construction
        ///
        /// # Errors
        ///
        /// Returns [`Error::DuplicateAttribute`](crate::Error::DuplicateAttribute) if the id is taken.
        pub fn add_attribute(&self, attribute: $crate::tree::ConfigAttribute) -> $crate::Result<()> {
            self.base().add_attribute(attribute)
        }

        /// Read an attribute through a derived type; `Ok(None)` if absent
        ///
        /// # Errors
        ///
        /// Returns a [`DecodeError`](crate::DecodeError) if the stored value cannot be converted.
        pub fn attribute_value<R: 'static, K: $crate::schema::TypeKind>(
            &self,
            id: &$crate::tree::FiberId,
            ty: &$crate::schema::DerivedType<R, K>,
        ) -> std::result::Result<Option<R>, $crate::DecodeError> {
            self.base()
                .attribute(id)
                .map(|attr| attr.value_as(ty))
                .transpose()
        }

        /// Replace an attribute's value; `false` if absent or rejected by its type
        pub fn set_attribute_value(
            &self,
            id: &$crate::tree::FiberId,
            value: $crate::schema::ConfigValue,
        ) -> bool {
            self.base().set_attribute_value(id, value)
        }
    };
}

pub(crate) use node_accessors;

// =============================================================================
// ConfigNode
// =============================================================================

/// Handle to any node in a configuration tree
#[derive(Clone)]
pub enum ConfigNode {
    Leaf(Rc<ConfigLeaf>),
    Tree(Rc<ConfigTree>),
}

impl ConfigNode {
    pub(crate) fn base(&self) -> &NodeBase {
        match self {
            ConfigNode::Leaf(leaf) => leaf.base(),
            ConfigNode::Tree(tree) => tree.base(),
        }
    }

    node_accessors!();

    pub fn as_leaf(&self) -> Option<&Rc<ConfigLeaf>> {
        match self {
            ConfigNode::Leaf(leaf) => Some(leaf),
            ConfigNode::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Rc<ConfigTree>> {
        match self {
            ConfigNode::Tree(tree) => Some(tree),
            ConfigNode::Leaf(_) => None,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ConfigNode) -> bool {
        match (self, other) {
            (ConfigNode::Leaf(a), ConfigNode::Leaf(b)) => Rc::ptr_eq(a, b),
            (ConfigNode::Tree(a), ConfigNode::Tree(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNode::Leaf(leaf) => f
                .debug_struct("Leaf")
                .field("name", &leaf.name())
                .field("type", &leaf.config_type().to_string())
                .field("value", &leaf.value())
                .finish(),
            ConfigNode::Tree(tree) => f
                .debug_struct("Tree")
                .field("name", &tree.name())
                .field("children", &tree.items().names())
                .finish(),
        }
    }
}

impl From<Rc<ConfigLeaf>> for ConfigNode {
    fn from(leaf: Rc<ConfigLeaf>) -> Self {
        ConfigNode::Leaf(leaf)
    }
}

impl From<Rc<ConfigTree>> for ConfigNode {
    fn from(tree: Rc<ConfigTree>) -> Self {
        ConfigNode::Tree(tree)
    }
}
