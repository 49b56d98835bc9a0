//! Storage Integration Tests
//!
//! Tests for loading and saving trees with `ConfigFile`:
//! - Save then load into a fresh tree
//! - Missing files and nested directories
//! - Broken files leave the tree untouched

mod common;

use common::{TestEnv, build_settings_tree};
use fiberconf::schema::ConfigValue;
use fiberconf::{ConfigFile, Error, JsonValueSerializer, StorageOptions};

#[test]
fn test_save_then_load_into_fresh_tree() {
    let env = TestEnv::new();
    let file = ConfigFile::new(env.path("settings.json"), JsonValueSerializer::new());

    let source = build_settings_tree().unwrap();
    source.lookup_leaf("ui.theme").unwrap().set_value(ConfigValue::from("light"));
    source.lookup_leaf("network.port").unwrap().set_value(ConfigValue::from(9000));
    file.save(&source).unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    assert!(content.contains("\"theme\": \"light\""), "{content}");
    assert!(content.ends_with('\n'));

    let target = build_settings_tree().unwrap();
    assert!(file.load(&target).unwrap());
    assert_eq!(
        target.lookup_leaf("ui.theme").unwrap().value(),
        Some(ConfigValue::from("light"))
    );
    assert_eq!(
        target.lookup_leaf("network.port").unwrap().value(),
        Some(ConfigValue::from(9000))
    );
}

#[test]
fn test_load_missing_file_keeps_defaults() {
    let env = TestEnv::new();
    let file = ConfigFile::new(env.path("absent.json"), JsonValueSerializer::new());
    let tree = build_settings_tree().unwrap();

    assert!(!file.exists());
    assert!(!file.load(&tree).unwrap());
    assert_eq!(
        tree.lookup_leaf("general.tray").unwrap().value(),
        Some(ConfigValue::from(true))
    );
}

#[test]
fn test_save_into_nested_directory() {
    let env = TestEnv::new();
    let path = env.path("a/b/c/settings.json");
    let file = ConfigFile::new(&path, JsonValueSerializer::compact());

    file.save(&build_settings_tree().unwrap()).unwrap();
    assert!(path.is_file());

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, ["settings.json"]);
}

#[test]
fn test_non_atomic_save_overwrites_in_place() {
    let env = TestEnv::new();
    let path = env.path("settings.json");
    std::fs::write(&path, "stale contents that are much longer than the new file").unwrap();

    let options = StorageOptions::new().with_atomic_write(false);
    let file = ConfigFile::with_options(&path, JsonValueSerializer::compact(), options);
    file.save(&build_settings_tree().unwrap()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with('{') && content.ends_with('}'), "{content}");
}

#[test]
fn test_broken_file_leaves_tree_untouched() {
    let env = TestEnv::new();
    let path = env.path("settings.json");
    std::fs::write(&path, r#"{"ui": {"theme": "light"}, "general": {"tray": "#).unwrap();

    let tree = build_settings_tree().unwrap();
    let err = ConfigFile::new(&path, JsonValueSerializer::new())
        .load(&tree)
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(
        tree.lookup_leaf("ui.theme").unwrap().value(),
        Some(ConfigValue::from("dark"))
    );
}

#[test]
fn test_unreadable_path_is_file_read_error() {
    let env = TestEnv::new();
    // A directory cannot be read as a file
    std::fs::create_dir(env.path("settings.json")).unwrap();

    let file = ConfigFile::new(env.path("settings.json"), JsonValueSerializer::new());
    let err = file.load(&build_settings_tree().unwrap()).unwrap_err();
    assert!(matches!(err, Error::FileRead { .. } | Error::Io(_)), "{err:?}");
}
