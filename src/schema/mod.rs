//! Type system: platform values, type kinds and derived runtime types
//!
//! - [`ConfigValue`]: the serialized form every leaf stores
//! - [`ConfigType`]: the closed set of kinds with their constraints
//! - [`DerivedType`]: a kind paired with a runtime representation
//! - [`types`]: presets for common Rust types

mod derived;
mod kinds;
pub mod types;
mod value;

pub use derived::{DerivedType, TypeKind};
pub use kinds::{
    BooleanConfigType, ConfigType, DecimalConfigType, EnumConfigType, ListConfigType,
    MapConfigType, Pattern, RecordConfigType, StringConfigType,
};
pub use value::ConfigValue;
