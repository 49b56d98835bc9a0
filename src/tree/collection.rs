use crate::error::{Error, Result};
use log::trace;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::node::ParentLink;
use super::{ConfigNode, ConfigTree};

/// Child names are path segments: non-empty and free of the `.` separator
fn check_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "names cannot be empty"
    } else if name.contains('.') {
        "names cannot contain '.'"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Name-keyed set of a tree's children.
///
/// Adding a node makes the owning tree its parent and removing it clears the
/// link, so a node is never held by two collections at once. Iteration is in
/// name order.
pub struct NodeCollection {
    /// Dangling while the collection belongs to a builder
    owner: Weak<ConfigTree>,
    children: RefCell<BTreeMap<String, ConfigNode>>,
}

impl NodeCollection {
    /// Collection for a tree that is still being built
    pub(crate) fn detached() -> Self {
        Self {
            owner: Weak::new(),
            children: RefCell::new(BTreeMap::new()),
        }
    }

    /// Hand the collection to its tree and point every child at it
    pub(crate) fn adopt(mut self, owner: Weak<ConfigTree>) -> Self {
        let children = std::mem::take(&mut self.children);
        for child in children.borrow().values() {
            child.base().set_parent(ParentLink::Attached(owner.clone()));
        }
        Self { owner, children }
    }

    fn link(&self) -> ParentLink {
        if self.owner.strong_count() > 0 {
            ParentLink::Attached(self.owner.clone())
        } else {
            ParentLink::Pending
        }
    }

    /// Add `child` under its own name.
    ///
    /// With `overwrite`, a sibling of the same name is replaced and detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or contains the
    /// `.` path separator, [`Error::DuplicateChild`] if the name is taken and `overwrite`
    /// is false, [`Error::AlreadyAttached`] if `child` already has a parent, or
    /// [`Error::Cycle`] if `child` is this collection's tree or one of its ancestors.
    /// Nothing changes on error.
    pub fn add(&self, child: impl Into<ConfigNode>, overwrite: bool) -> Result<()> {
        let child = child.into();
        let name = child.name().to_string();
        check_name(&name)?;
        let mut children = self.children.borrow_mut();
        if !overwrite && children.contains_key(&name) {
            return Err(Error::DuplicateChild { name });
        }
        if child.base().is_attached() {
            return Err(Error::AlreadyAttached { name });
        }
        if let ConfigNode::Tree(tree) = &child {
            if self.has_ancestor(tree) {
                return Err(Error::Cycle { name });
            }
        }
        child.base().set_parent(self.link());
        if let Some(replaced) = children.insert(name, child) {
            trace!("Replaced child '{}'", replaced.name());
            replaced.base().set_parent(ParentLink::Detached);
        }
        Ok(())
    }

    /// Whether `tree` is the owner or one of its ancestors
    fn has_ancestor(&self, tree: &Rc<ConfigTree>) -> bool {
        let mut current = self.owner.upgrade();
        while let Some(ancestor) = current {
            if Rc::ptr_eq(&ancestor, tree) {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }

    /// Remove the child called `name` and detach it
    pub fn remove_by_name(&self, name: &str) -> Option<ConfigNode> {
        let removed = self.children.borrow_mut().remove(name)?;
        removed.base().set_parent(ParentLink::Detached);
        Some(removed)
    }

    /// Remove `node` if it is held here; identity, not name, decides
    pub fn remove(&self, node: &ConfigNode) -> bool {
        let held = self
            .children
            .borrow()
            .get(node.name())
            .is_some_and(|child| child.ptr_eq(node));
        held && self.remove_by_name(node.name()).is_some()
    }

    pub fn get_by_name(&self, name: &str) -> Option<ConfigNode> {
        self.children.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.children.borrow().keys().cloned().collect()
    }

    /// Snapshot of the children, in name order
    pub fn nodes(&self) -> Vec<ConfigNode> {
        self.children.borrow().values().cloned().collect()
    }

    /// Remove and detach every child
    pub fn clear(&self) {
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children.values() {
            child.base().set_parent(ParentLink::Detached);
        }
    }

    /// The tree owning this collection, once built
    pub fn owner(&self) -> Option<Rc<ConfigTree>> {
        self.owner.upgrade()
    }
}

// Children of a dropped builder become free to join another tree
impl Drop for NodeCollection {
    fn drop(&mut self) {
        for child in self.children.get_mut().values() {
            child.base().set_parent(ParentLink::Detached);
        }
    }
}

impl fmt::Debug for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.children.borrow().values()).finish()
    }
}
