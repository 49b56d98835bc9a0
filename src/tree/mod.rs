//! Configuration trees: leaves, subtrees and the collections linking them
//!
//! Trees own their children through [`NodeCollection`]; children point back
//! at their parent weakly, so dropping the root frees the whole tree.

mod attribute;
mod branch;
mod collection;
mod id;
mod leaf;
mod node;

pub use attribute::ConfigAttribute;
pub use branch::ConfigTree;
pub use collection::NodeCollection;
pub use id::FiberId;
pub use leaf::{ConfigLeaf, Property, PropertyMirror, ValueListener};
pub use node::ConfigNode;

pub(crate) use node::NodeBase;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConfigTreeBuilder;
    use crate::error::Error;
    use crate::schema::{ConfigValue, types};
    use std::rc::Rc;

    fn sample() -> Rc<ConfigTree> {
        let mut builder = ConfigTreeBuilder::new();
        builder
            .begin_value("version", &types::integer(), 1)
            .finish_value()
            .unwrap()
            .fork("graphics", |graphics| {
                graphics
                    .begin_value("fov", &types::double(), 90.0)
                    .finish_value()?;
                Ok(())
            })
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_children_point_at_parent() {
        let root = sample();
        let graphics = root.lookup_tree("graphics").unwrap();
        let fov = root.lookup_leaf("graphics.fov").unwrap();

        assert!(Rc::ptr_eq(&graphics.parent().unwrap(), &root));
        assert!(Rc::ptr_eq(&fov.parent().unwrap(), &graphics));
        assert_eq!(fov.path(), "graphics.fov");
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_lookup_misses() {
        let root = sample();
        assert!(root.lookup("graphics.missing").is_none());
        assert!(root.lookup("version.deeper").is_none());
        assert!(root.lookup_tree("version").is_none());
        assert!(root.lookup_leaf("graphics").is_none());
    }

    #[test]
    fn test_duplicate_add_leaves_collection_unchanged() {
        let root = sample();
        let other = sample();
        let stray = other.items().remove_by_name("version").unwrap();
        assert!(stray.parent().is_none());

        let err = root.items().add(stray.clone(), false).unwrap_err();
        assert!(matches!(err, Error::DuplicateChild { .. }));
        assert!(stray.parent().is_none());
        assert_eq!(root.items().len(), 2);

        let previous = root.items().get_by_name("version").unwrap();
        root.items().add(stray.clone(), true).unwrap();
        assert!(previous.parent().is_none());
        assert!(Rc::ptr_eq(&stray.parent().unwrap(), &root));
    }

    #[test]
    fn test_attached_node_cannot_be_added_elsewhere() {
        let root = sample();
        let other = sample();
        let graphics = ConfigNode::from(root.lookup_tree("graphics").unwrap());
        other.items().remove_by_name("graphics");

        let err = other.items().add(graphics.clone(), false).unwrap_err();
        assert!(matches!(err, Error::AlreadyAttached { .. }));

        assert!(root.items().remove(&graphics));
        other.items().add(graphics.clone(), false).unwrap();
        assert!(Rc::ptr_eq(&graphics.parent().unwrap(), &other));
    }

    #[test]
    fn test_tree_cannot_contain_itself() {
        let root = sample();
        let graphics = root.lookup_tree("graphics").unwrap();
        root.items().remove_by_name("graphics");

        let err = graphics
            .items()
            .add(ConfigNode::Tree(Rc::clone(&graphics)), false)
            .unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
    }

    #[test]
    fn test_leaves_in_order() {
        let root = sample();
        let names: Vec<String> = root.leaves().iter().map(|leaf| leaf.path()).collect();
        assert_eq!(names, ["graphics.fov", "version"]);
        assert_eq!(
            root.lookup_leaf("version").unwrap().value(),
            Some(ConfigValue::from(1))
        );
    }
}
