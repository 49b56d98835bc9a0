use std::fmt;
use std::rc::Rc;

use super::node::{NodeBase, node_accessors};
use super::{ConfigLeaf, ConfigNode, NodeCollection};

/// Node holding named children
pub struct ConfigTree {
    base: NodeBase,
    items: NodeCollection,
}

impl ConfigTree {
    pub(crate) fn new(base: NodeBase, items: NodeCollection) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            base,
            items: items.adopt(this.clone()),
        })
    }

    pub(crate) fn base(&self) -> &NodeBase {
        &self.base
    }

    node_accessors!();

    /// The children of this tree
    pub fn items(&self) -> &NodeCollection {
        &self.items
    }

    /// Find a descendant by dotted path, e.g. `"graphics.fov"`
    pub fn lookup(&self, path: &str) -> Option<ConfigNode> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut node = self.items.get_by_name(first)?;
        for segment in segments {
            let next = node.as_tree()?.items().get_by_name(segment)?;
            node = next;
        }
        Some(node)
    }

    pub fn lookup_leaf(&self, path: &str) -> Option<Rc<ConfigLeaf>> {
        match self.lookup(path)? {
            ConfigNode::Leaf(leaf) => Some(leaf),
            ConfigNode::Tree(_) => None,
        }
    }

    pub fn lookup_tree(&self, path: &str) -> Option<Rc<ConfigTree>> {
        match self.lookup(path)? {
            ConfigNode::Tree(tree) => Some(tree),
            ConfigNode::Leaf(_) => None,
        }
    }

    /// All leaves below this tree, depth first in name order
    pub fn leaves(&self) -> Vec<Rc<ConfigLeaf>> {
        let mut out = Vec::new();
        for node in self.items.nodes() {
            match node {
                ConfigNode::Leaf(leaf) => out.push(leaf),
                ConfigNode::Tree(tree) => out.extend(tree.leaves()),
            }
        }
        out
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("name", &self.name())
            .field("items", &self.items)
            .finish()
    }
}
