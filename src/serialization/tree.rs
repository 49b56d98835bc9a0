//! Whole-tree serialization
//!
//! Leaves without a value are not written. On read, entries that match no
//! node are skipped, and nothing is applied unless every matched entry
//! decodes and satisfies its leaf's type.

use crate::error::{DecodeError, Result};
use crate::tree::{ConfigLeaf, ConfigNode, ConfigTree};
use crate::schema::ConfigValue;
use log::{debug, info};
use std::io::{Read, Write};
use std::rc::Rc;

use super::ValueSerializer;

/// Encode every leaf value under `tree` into a new document
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`](crate::Error::TypeMismatch) if a stored
/// value does not have its leaf type's shape.
pub fn serialize_tree<S: ValueSerializer>(tree: &ConfigTree, serializer: &S) -> Result<S::Target> {
    let mut target = serializer.new_target();
    for node in tree.items().nodes() {
        match &node {
            ConfigNode::Leaf(leaf) => {
                let Some(value) = leaf.value() else {
                    continue;
                };
                let element = leaf.config_type().serialize_value(&value, serializer)?;
                serializer.add_element(leaf.name(), element, &mut target, leaf.comment());
            }
            ConfigNode::Tree(sub) => {
                let sub_target = serialize_tree(sub, serializer)?;
                serializer.add_sub_element(sub.name(), sub_target, &mut target, sub.comment());
            }
        }
    }
    Ok(target)
}

/// Encode `tree` and write the document
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn serialize<S: ValueSerializer>(tree: &ConfigTree, writer: &mut dyn Write, serializer: &S) -> Result<()> {
    let target = serialize_tree(tree, serializer)?;
    serializer.write_target(&target, writer)
}

type Pending = Vec<(Rc<ConfigLeaf>, ConfigValue)>;

fn collect<S: ValueSerializer>(
    tree: &ConfigTree,
    entries: Vec<(&str, &S::Element)>,
    serializer: &S,
    pending: &mut Pending,
) -> std::result::Result<(), DecodeError> {
    for (name, element) in entries {
        match tree.items().get_by_name(name) {
            None => debug!("Skipping unknown entry '{name}' in '{}'", tree.path()),
            Some(ConfigNode::Leaf(leaf)) => {
                let ty = leaf.config_type();
                let value = ty
                    .deserialize_value(element, serializer)
                    .map_err(|e| e.within(name))?;
                if !ty.accepts(&value) {
                    return Err(DecodeError::new(
                        &value,
                        ty.to_string(),
                        "value does not satisfy type constraints",
                    )
                    .within(name));
                }
                pending.push((leaf, value));
            }
            Some(ConfigNode::Tree(sub)) => {
                let sub_entries = serializer.sub_elements(element).map_err(|e| e.within(name))?;
                collect(&sub, sub_entries, serializer, pending).map_err(|e| e.within(name))?;
            }
        }
    }
    Ok(())
}

/// Apply a parsed document to `tree`.
///
/// All entries are decoded and validated first; leaf values are only set
/// (and listeners notified) once the whole document is known to be good.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) with the dotted path of the
/// first entry that cannot be decoded or is rejected by its leaf's type.
pub fn deserialize_tree<S: ValueSerializer>(
    tree: &ConfigTree,
    target: &S::Target,
    serializer: &S,
) -> Result<()> {
    let mut pending = Vec::new();
    collect(tree, serializer.elements(target), serializer, &mut pending)?;
    let count = pending.len();
    for (leaf, value) in pending {
        leaf.set_value(value);
    }
    debug!("Applied {count} values to '{}'", tree.path());
    Ok(())
}

/// Read a document and apply it to `tree`
///
/// # Errors
///
/// Returns an error if reading or parsing fails, or any error of [`deserialize_tree`].
pub fn deserialize<S: ValueSerializer>(tree: &ConfigTree, reader: &mut dyn Read, serializer: &S) -> Result<()> {
    let target = serializer.read_target(reader)?;
    deserialize_tree(tree, &target, serializer)?;
    info!("Configuration loaded into '{}'", tree.path());
    Ok(())
}
