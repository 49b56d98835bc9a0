//! # fiberconf - Typed Configuration Trees
//!
//! A format-agnostic library for defining, validating and storing structured
//! configuration under a closed set of constrained types.
//!
//! ## Features
//!
//! - **Constrained Types**: booleans, decimals with bounds and increments, strings with
//!   length and pattern limits, enums, lists, maps and records
//! - **Derived Types**: map stored values to any runtime type (`u16`, `char`, your own enums)
//!   while keeping the constraints
//! - **Config Trees**: named leaves grouped into trees, with unique sibling names and
//!   change listeners
//! - **Any Format**: JSON by default, TOML and YAML behind features, or your own
//!   [`ValueSerializer`](serialization::ValueSerializer)
//! - **Schema Export**: describe every type as JSON for UIs and validators
//!
//! ## Quick Start
//!
//! ```rust
//! use fiberconf::Property;
//! use fiberconf::builder::ConfigTreeBuilder;
//! use fiberconf::schema::types;
//! use fiberconf::serialization::{JsonValueSerializer, serialize};
//!
//! # fn main() -> fiberconf::Result<()> {
//! let fov_type = types::integer().with_minimum(30)?.with_maximum(110)?;
//!
//! let mut builder = ConfigTreeBuilder::new();
//! builder
//!     .begin_value("fov", &fov_type, 90)
//!     .with_comment("Field of view in degrees")
//!     .finish_value()?
//!     .fork("audio", |audio| {
//!         audio.begin_value("muted", &types::boolean(), false).finish_value()?;
//!         Ok(())
//!     })?;
//! let tree = builder.build()?;
//!
//! let fov = tree.lookup_leaf("fov").expect("declared above").mirror(&fov_type)?;
//! assert!(!fov.set_value(200));
//! assert!(fov.set_value(100));
//!
//! let mut out = Vec::new();
//! serialize(&tree, &mut out, &JsonValueSerializer::compact())?;
//! assert_eq!(String::from_utf8_lossy(&out), r#"{"audio":{"muted":false},"fov":100}"#);
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading Files
//!
//! ```rust,no_run
//! use fiberconf::storage::ConfigFile;
//! use fiberconf::serialization::JsonValueSerializer;
//! # fn example(tree: &fiberconf::ConfigTree) -> fiberconf::Result<()> {
//! let file = ConfigFile::new("config/settings.json", JsonValueSerializer::new());
//! file.load(tree)?;
//! file.save(tree)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `json` (default): JSON values and schema export
//! - `toml`: [`TomlValueSerializer`](serialization::TomlValueSerializer)
//! - `yaml`: [`YamlValueSerializer`](serialization::YamlValueSerializer)
//! - `full`: everything above

pub mod builder;
mod docs;
mod error;
pub mod schema;
pub mod serialization;
pub mod storage;
pub mod tree;

pub use docs::{DocsConfig, generate_docs};
pub use error::{BoxedCause, DecodeError, Error, Result};

// Re-export the types most programs touch
pub use builder::{ConfigLeafBuilder, ConfigTreeBuilder};
pub use schema::{ConfigType, ConfigValue, DerivedType, TypeKind};
pub use serialization::{JsonTypeSerializer, JsonValueSerializer, TypeSerializer, ValueSerializer};
pub use storage::{ConfigFile, StorageOptions};
pub use tree::{ConfigLeaf, ConfigNode, ConfigTree, FiberId, Property, PropertyMirror};
