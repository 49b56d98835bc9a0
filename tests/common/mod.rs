//! Common test utilities for fiberconf integration tests
//!
//! Provides a shared settings tree, a sample enum, and helper functions.

#![allow(dead_code)]

use fiberconf::schema::types::{self, ConfigEnum};
use fiberconf::schema::DerivedType;
use fiberconf::schema::{EnumConfigType, ListConfigType, StringConfigType};
use fiberconf::{ConfigTree, ConfigTreeBuilder, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

// =============================================================================
// Sample Enum
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl ConfigEnum for Color {
    fn variants() -> &'static [Self] {
        &[Color::Red, Color::Green, Color::Blue]
    }

    fn name(&self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
        }
    }
}

// =============================================================================
// Types
// =============================================================================

pub fn theme_type() -> DerivedType<String, EnumConfigType> {
    types::enum_of(["light", "dark", "system"]).unwrap()
}

pub fn font_size_type() -> DerivedType<Decimal, fiberconf::schema::DecimalConfigType> {
    types::unbounded_decimal()
        .with_minimum(dec!(8))
        .and_then(|t| t.with_maximum(dec!(32)))
        .and_then(|t| t.with_increment(dec!(0.5)))
        .unwrap()
}

pub fn language_type() -> DerivedType<String, StringConfigType> {
    types::string()
        .with_min_length(2)
        .and_then(|t| t.with_max_length(5))
        .and_then(|t| t.with_pattern("[a-z]{2}(-[A-Z]{2})?"))
        .unwrap()
}

pub fn colors_type() -> DerivedType<Vec<Color>, ListConfigType> {
    types::make_list(&types::make_enum::<Color>().unwrap())
        .with_max_size(3)
        .unwrap()
        .with_unique_elements()
}

pub fn limits_type() -> DerivedType<BTreeMap<String, i32>, fiberconf::schema::MapConfigType> {
    types::make_map(&types::string(), &types::integer())
}

// =============================================================================
// Settings Tree
// =============================================================================

/// Build the shared settings tree:
///
/// ```text
/// colors            [RED, BLUE]
/// general.language  "en"
/// general.tray      true
/// limits            {}
/// network.hosts     ["localhost"]
/// network.port      8080
/// ui.font_size      14
/// ui.theme          "dark"
/// ```
pub fn build_settings_tree() -> Result<Rc<ConfigTree>> {
    let mut builder = ConfigTreeBuilder::new();
    builder
        .begin_value("colors", &colors_type(), vec![Color::Red, Color::Blue])
        .with_comment("Highlight colors")
        .finish_value()?
        .begin_value("limits", &limits_type(), BTreeMap::new())
        .finish_value()?
        .fork("general", |general| {
            general
                .with_comment("General behavior")
                .begin_value("language", &language_type(), "en".to_string())
                .finish_value()?
                .begin_value("tray", &types::boolean(), true)
                .with_comment("Show an icon in the system tray")
                .finish_value()?;
            Ok(())
        })?
        .fork("network", |network| {
            network
                .begin_value("hosts", &types::make_list(&types::string()), vec!["localhost".to_string()])
                .finish_value()?
                .begin_value("port", &types::unsigned_short().with_minimum(1)?, 8080)
                .finish_value()?;
            Ok(())
        })?
        .fork("ui", |ui| {
            ui.begin_value("font_size", &font_size_type(), dec!(14))
                .finish_value()?
                .begin_value("theme", &theme_type(), "dark".to_string())
                .finish_value()?;
            Ok(())
        })?;
    builder.build()
}

/// Every leaf path of [`build_settings_tree`], in iteration order
pub const LEAF_PATHS: [&str; 8] = [
    "colors",
    "general.language",
    "general.tray",
    "limits",
    "network.hosts",
    "network.port",
    "ui.font_size",
    "ui.theme",
];

// =============================================================================
// Environment
// =============================================================================

pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join(file_name)
    }
}
