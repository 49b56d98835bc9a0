//! Tree Workflow Integration Tests
//!
//! Tests for building and mutating configuration trees:
//! - Lookup and iteration order
//! - Sibling uniqueness and overwrite semantics
//! - Value changes, listeners and typed mirrors
//! - Build-time validation

mod common;

use common::{Color, LEAF_PATHS, build_settings_tree, colors_type, font_size_type};
use fiberconf::schema::types;
use fiberconf::schema::{ConfigValue, DecimalConfigType};
use fiberconf::{
    ConfigLeafBuilder, ConfigNode, ConfigTreeBuilder, DocsConfig, Error, FiberId, Property,
    generate_docs,
};
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_leaves_iterate_in_name_order() {
    let tree = build_settings_tree().unwrap();

    let paths: Vec<String> = tree.leaves().iter().map(|leaf| leaf.path()).collect();
    assert_eq!(paths, LEAF_PATHS);
    assert_eq!(tree.items().names(), ["colors", "general", "limits", "network", "ui"]);
}

#[test]
fn test_parents_and_paths() {
    let tree = build_settings_tree().unwrap();

    let port = tree.lookup_leaf("network.port").unwrap();
    let network = port.parent().unwrap();
    assert_eq!(network.name(), "network");
    assert!(Rc::ptr_eq(&network.parent().unwrap(), &tree));
    assert!(tree.parent().is_none());

    assert!(tree.lookup("network.port.deeper").is_none());
    assert!(tree.lookup_tree("network.port").is_none());
    assert!(tree.lookup_leaf("network").is_none());
}

#[test]
fn test_duplicate_add_without_overwrite_changes_nothing() {
    let tree = build_settings_tree().unwrap();
    let original = tree.lookup_leaf("ui.theme").unwrap();

    let replacement = ConfigLeafBuilder::new("theme", &types::boolean())
        .with_default_value(true)
        .build()
        .unwrap();
    let ui = tree.lookup_tree("ui").unwrap();

    let err = ui.items().add(Rc::clone(&replacement), false).unwrap_err();
    assert!(err.is_duplicate_child());
    assert!(replacement.parent().is_none());

    let current = ui.items().get_by_name("theme").unwrap();
    assert!(current.ptr_eq(&ConfigNode::Leaf(original)));
}

#[test]
fn test_duplicate_add_with_overwrite_detaches_old_child() {
    let tree = build_settings_tree().unwrap();
    let ui = tree.lookup_tree("ui").unwrap();
    let original = tree.lookup_leaf("ui.theme").unwrap();

    let replacement = ConfigLeafBuilder::new("theme", &types::boolean())
        .with_default_value(true)
        .build()
        .unwrap();
    ui.items().add(Rc::clone(&replacement), true).unwrap();

    assert!(original.parent().is_none());
    assert!(Rc::ptr_eq(&replacement.parent().unwrap(), &ui));
    assert_eq!(ui.items().len(), 2);
    assert_eq!(
        tree.lookup_leaf("ui.theme").unwrap().value(),
        Some(ConfigValue::from(true))
    );
}

#[test]
fn test_node_moves_between_trees_only_after_removal() {
    let tree = build_settings_tree().unwrap();
    let general = tree.lookup_tree("general").unwrap();
    let network = tree.lookup_tree("network").unwrap();

    let tray = general.items().get_by_name("tray").unwrap();
    let err = network.items().add(tray.clone(), false).unwrap_err();
    assert!(matches!(err, Error::AlreadyAttached { .. }));

    assert!(general.items().remove(&tray));
    network.items().add(tray, false).unwrap();
    assert!(tree.lookup_leaf("network.tray").is_some());
    assert!(tree.lookup_leaf("general.tray").is_none());
}

#[test]
fn test_tree_cannot_contain_itself() {
    let tree = build_settings_tree().unwrap();
    let ui = tree.lookup_tree("ui").unwrap();

    tree.items().remove_by_name("ui").unwrap();
    let err = ui.items().add(Rc::clone(&ui), false).unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }));
}

/// Small xorshift generator so the edit sequence is the same on every run
struct Sequence(u64);

impl Sequence {
    fn next(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }
}

#[test]
fn test_children_stay_unique_across_edit_sequence() {
    let root = ConfigTreeBuilder::new().build().unwrap();
    let names = ["alpha", "beta", "gamma", "delta"];

    // Two candidates per name, half leaves and half trees
    let pool: Vec<ConfigNode> = (0..8)
        .map(|i| {
            let name = names[i % names.len()];
            if i % 2 == 0 {
                ConfigNode::from(
                    ConfigLeafBuilder::new(name, &types::integer())
                        .with_default_value(i as i32)
                        .build()
                        .unwrap(),
                )
            } else {
                ConfigNode::from(ConfigTreeBuilder::named(name).build().unwrap())
            }
        })
        .collect();

    // Expected holder of each name, as an index into `pool`
    let mut held: BTreeMap<&str, usize> = BTreeMap::new();
    let mut sequence = Sequence(0x9E37_79B9_7F4A_7C15);

    for step in 0..500 {
        let k = sequence.next(pool.len());
        let name = pool[k].name();
        match sequence.next(4) {
            op @ (0 | 1) => {
                let overwrite = op == 1;
                let result = root.items().add(pool[k].clone(), overwrite);
                if !overwrite && held.contains_key(name) {
                    assert!(matches!(result, Err(Error::DuplicateChild { .. })), "step {step}");
                } else if held.get(name) == Some(&k) {
                    assert!(matches!(result, Err(Error::AlreadyAttached { .. })), "step {step}");
                } else {
                    assert!(result.is_ok(), "step {step}: {result:?}");
                    held.insert(name, k);
                }
            }
            2 => {
                let removed = root.items().remove_by_name(name);
                match held.remove(name) {
                    Some(index) => assert!(removed.unwrap().ptr_eq(&pool[index]), "step {step}"),
                    None => assert!(removed.is_none(), "step {step}"),
                }
            }
            _ => {
                let expected = held.get(name) == Some(&k);
                assert_eq!(root.items().remove(&pool[k]), expected, "step {step}");
                if expected {
                    held.remove(name);
                }
            }
        }

        let mut names_now = root.items().names();
        assert_eq!(names_now, held.keys().copied().collect::<Vec<_>>(), "step {step}");
        names_now.dedup();
        assert_eq!(names_now.len(), root.items().len(), "step {step}");

        for (index, node) in pool.iter().enumerate() {
            if held.get(node.name()) == Some(&index) {
                assert!(root.items().get_by_name(node.name()).unwrap().ptr_eq(node));
                assert!(Rc::ptr_eq(&node.parent().unwrap(), &root), "step {step}");
            } else {
                assert!(node.parent().is_none(), "step {step}: {} still linked", node.name());
            }
        }
    }
}

// =============================================================================
// Values and Listeners
// =============================================================================

#[test]
fn test_set_value_notifies_listeners_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut builder = ConfigTreeBuilder::new();
    let first = Rc::clone(&seen);
    let second = Rc::clone(&seen);
    builder
        .begin_value("volume", &types::integer().with_minimum(0).unwrap(), 5)
        .with_listener(move |previous, current| {
            first.borrow_mut().push(format!("first {previous:?} -> {current}"));
        })
        .with_listener(move |_, current| {
            second.borrow_mut().push(format!("second {current}"));
        })
        .finish_value()
        .unwrap();
    let tree = builder.build().unwrap();
    let volume = tree.lookup_leaf("volume").unwrap();

    assert!(!volume.set_value(ConfigValue::from(-1)));
    assert!(seen.borrow().is_empty());
    assert_eq!(volume.value(), Some(ConfigValue::from(5)));

    assert!(volume.set_value(ConfigValue::from(7)));
    assert_eq!(*seen.borrow(), ["first Some(5) -> 7", "second 7"]);
    assert_eq!(volume.value(), Some(ConfigValue::from(7)));
}

#[test]
fn test_reset_restores_default() {
    let tree = build_settings_tree().unwrap();
    let theme = tree.lookup_leaf("ui.theme").unwrap();

    assert!(theme.set_value(ConfigValue::from("light")));
    assert!(!theme.set_value(ConfigValue::from("purple")));
    assert!(theme.reset());
    assert_eq!(theme.value(), Some(ConfigValue::from("dark")));
}

#[test]
fn test_leaf_without_default_has_no_value() {
    let mut builder = ConfigTreeBuilder::new();
    builder.begin_leaf("token", &types::string()).finish_value().unwrap();
    let tree = builder.build().unwrap();
    let token = tree.lookup_leaf("token").unwrap();

    assert!(!token.has_value());
    assert!(!token.reset());
    assert!(token.set_value(ConfigValue::from("abc")));
    assert!(token.has_value());
}

#[test]
fn test_mirror_reads_and_writes_runtime_values() {
    let tree = build_settings_tree().unwrap();
    let colors = tree.lookup_leaf("colors").unwrap().mirror(&colors_type()).unwrap();

    assert_eq!(colors.value(), Some(vec![Color::Red, Color::Blue]));
    assert!(colors.set_value(vec![Color::Green]));
    assert!(!colors.set_value(vec![Color::Green, Color::Green]));
    assert_eq!(
        tree.lookup_leaf("colors").unwrap().value(),
        Some(ConfigValue::from(vec!["GREEN"]))
    );

    // A mirror must agree on the serialized type
    let err = tree
        .lookup_leaf("ui.font_size")
        .unwrap()
        .mirror(&types::unbounded_decimal())
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));

    let font_size = tree.lookup_leaf("ui.font_size").unwrap().mirror(&font_size_type()).unwrap();
    assert!(font_size.accepts(&dec!(12.5)));
    assert!(!font_size.accepts(&dec!(12.25)));
}

#[test]
fn test_decimal_step_from_zero() {
    let even = DecimalConfigType::new(Some(dec!(0)), Some(dec!(10)), Some(dec!(2))).unwrap();
    let mut builder = ConfigTreeBuilder::new();
    builder
        .begin_raw_value("even", even, ConfigValue::from(4))
        .finish_value()
        .unwrap();
    let tree = builder.build().unwrap();
    let leaf = tree.lookup_leaf("even").unwrap();

    for accepted in [0, 2, 10] {
        assert!(leaf.set_value(ConfigValue::from(accepted)), "{accepted}");
    }
    for rejected in [3, 12, -2] {
        assert!(!leaf.set_value(ConfigValue::from(rejected)), "{rejected}");
    }
    assert!(!leaf.set_value(ConfigValue::Number(dec!(2.5))));
}

// =============================================================================
// Build-time Validation
// =============================================================================

#[test]
fn test_invalid_default_registers_nothing() {
    let short = types::string().with_max_length(3).unwrap();

    let mut builder = ConfigTreeBuilder::new();
    let err = builder
        .begin_value("name", &short, "toolong".to_string())
        .finish_value()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDefault { .. }));
    assert!(err.is_build_error());

    let tree = builder.build().unwrap();
    assert!(tree.items().is_empty());
}

#[test]
fn test_sibling_name_collision_fails_build_step() {
    let mut builder = ConfigTreeBuilder::new();
    builder
        .begin_value("port", &types::integer(), 1)
        .finish_value()
        .unwrap();

    let err = builder
        .fork("port", |_| Ok(()))
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, Error::Registration { .. }));
    assert!(err.is_duplicate_child());
}

#[test]
fn test_attributes() {
    let order = FiberId::new("ui", "order");
    let mut builder = ConfigTreeBuilder::new();
    builder
        .begin_value("theme", &common::theme_type(), "dark".to_string())
        .with_typed_attribute(order.clone(), &types::integer(), 3)
        .finish_value()
        .unwrap();
    let tree = builder.build().unwrap();
    let theme = tree.lookup_leaf("theme").unwrap();

    assert_eq!(theme.attribute_ids(), [order.clone()]);
    assert_eq!(theme.attribute_value(&order, &types::integer()).unwrap(), Some(3));
    assert!(theme.set_attribute_value(&order, ConfigValue::from(4)));
    assert!(!theme.set_attribute_value(&order, ConfigValue::from("four")));
}

#[test]
fn test_duplicate_attribute_is_build_error() {
    let id = FiberId::new("ui", "hidden");
    let err = ConfigLeafBuilder::new("secret", &types::string())
        .with_typed_attribute(id.clone(), &types::boolean(), true)
        .with_typed_attribute(id, &types::boolean(), false)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateAttribute { .. }));
}

// =============================================================================
// Docs
// =============================================================================

#[test]
fn test_generate_docs_for_settings_tree() {
    let tree = build_settings_tree().unwrap();
    let docs = generate_docs(&tree, DocsConfig::new().with_title("Test Settings"));

    assert!(docs.starts_with("# Test Settings"));
    assert!(docs.contains("## `general`"));
    assert!(docs.contains("General behavior"));
    assert!(docs.contains("### `general.tray`"));
    assert!(docs.contains("Show an icon in the system tray"));
    assert!(docs.contains("- `system`"));
}
