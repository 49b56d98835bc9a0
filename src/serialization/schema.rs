//! Type descriptions as JSON
//!
//! Every description carries a `"type"` tag. Bounds that are not set are
//! omitted, except `minLength` which is always written.

use crate::schema::{
    BooleanConfigType, ConfigType, DecimalConfigType, EnumConfigType, ListConfigType,
    MapConfigType, RecordConfigType, StringConfigType,
};
use serde_json::{Map, Value, json};

use super::TypeSerializer;
use super::json::decimal_to_json;

/// Writes [`ConfigType`] descriptions into JSON objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTypeSerializer;

impl JsonTypeSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Describe `ty` as a standalone object
    pub fn describe(&self, ty: &ConfigType) -> Map<String, Value> {
        let mut target = Map::new();
        ty.serialize_type(self, &mut target);
        target
    }
}

fn tag(target: &mut Map<String, Value>, kind: &str) {
    target.insert("type".into(), Value::String(kind.into()));
}

fn put_sizes(target: &mut Map<String, Value>, min: usize, max: Option<usize>) {
    target.insert("minSize".into(), json!(min));
    if let Some(max) = max {
        target.insert("maxSize".into(), json!(max));
    }
}

impl TypeSerializer for JsonTypeSerializer {
    type Target = Map<String, Value>;

    fn serialize_boolean(&self, _ty: &BooleanConfigType, target: &mut Self::Target) {
        tag(target, "boolean");
    }

    fn serialize_number(&self, ty: &DecimalConfigType, target: &mut Self::Target) {
        tag(target, "number");
        if let Some(min) = ty.minimum() {
            target.insert("min".into(), decimal_to_json(min));
        }
        if let Some(max) = ty.maximum() {
            target.insert("max".into(), decimal_to_json(max));
        }
        if let Some(increment) = ty.increment() {
            target.insert("increment".into(), decimal_to_json(increment));
            if !ty.has_implied_origin() {
                target.insert("origin".into(), decimal_to_json(ty.origin()));
            }
        }
    }

    fn serialize_string(&self, ty: &StringConfigType, target: &mut Self::Target) {
        tag(target, "string");
        target.insert("minLength".into(), json!(ty.min_length()));
        if let Some(max) = ty.max_length() {
            target.insert("maxLength".into(), json!(max));
        }
        if let Some(pattern) = ty.pattern() {
            target.insert("pattern".into(), json!(pattern.as_str()));
        }
    }

    fn serialize_enum(&self, ty: &EnumConfigType, target: &mut Self::Target) {
        tag(target, "enum");
        target.insert("values".into(), json!(ty.valid_values()));
    }

    fn serialize_list(&self, ty: &ListConfigType, target: &mut Self::Target) {
        tag(target, "list");
        target.insert(
            "elementType".into(),
            Value::Object(self.describe(ty.element_type())),
        );
        target.insert("unique".into(), json!(ty.has_unique_elements()));
        put_sizes(target, ty.min_size(), ty.max_size());
    }

    fn serialize_map(&self, ty: &MapConfigType, target: &mut Self::Target) {
        tag(target, "map");
        target.insert(
            "valueType".into(),
            Value::Object(self.describe(ty.value_type())),
        );
        put_sizes(target, ty.min_size(), ty.max_size());
    }

    fn serialize_record(&self, ty: &RecordConfigType, target: &mut Self::Target) {
        tag(target, "record");
        let fields: Vec<Value> = ty
            .fields()
            .iter()
            .map(|(name, field_type)| {
                json!({
                    "name": name,
                    "type": Value::Object(self.describe(field_type))
                })
            })
            .collect();
        target.insert("fields".into(), Value::Array(fields));
    }
}
