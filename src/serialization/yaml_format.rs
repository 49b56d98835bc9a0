//! YAML value serializer

use crate::error::{DecodeError, Error, Result};
use crate::schema::{
    BooleanConfigType, DecimalConfigType, EnumConfigType, ListConfigType, MapConfigType,
    RecordConfigType, StringConfigType,
};
use log::trace;
use rust_decimal::Decimal;
use serde_yaml::{Mapping, Number, Value};
use std::io::{Read, Write};

use super::{NativeNumber, ValueSerializer, native_number, parse_decimal};

/// Reads and writes configuration as YAML mappings.
///
/// Comments are dropped on write. Mapping keys must be strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlValueSerializer;

impl YamlValueSerializer {
    pub fn new() -> Self {
        Self
    }
}

fn wrong_shape(element: &Value, expected: &str) -> DecodeError {
    DecodeError::new(
        format!("{element:?}"),
        expected,
        format!("expected a YAML {expected}"),
    )
}

fn entries(element: &Value) -> std::result::Result<Vec<(&str, &Value)>, DecodeError> {
    let Value::Mapping(mapping) = element else {
        return Err(wrong_shape(element, "mapping"));
    };
    mapping
        .iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key.as_str(), value)),
            other => Err(DecodeError::new(
                format!("{other:?}"),
                "mapping",
                "mapping keys must be strings",
            )),
        })
        .collect()
}

fn text_of(element: &Value) -> std::result::Result<String, DecodeError> {
    element
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_shape(element, "string"))
}

impl ValueSerializer for YamlValueSerializer {
    type Element = Value;
    type Target = Mapping;

    fn serialize_boolean(&self, value: bool, _ty: &BooleanConfigType) -> Value {
        Value::Bool(value)
    }

    fn deserialize_boolean(
        &self,
        element: &Value,
        _ty: &BooleanConfigType,
    ) -> std::result::Result<bool, DecodeError> {
        element.as_bool().ok_or_else(|| wrong_shape(element, "boolean"))
    }

    fn serialize_number(&self, value: Decimal, _ty: &DecimalConfigType) -> Value {
        match native_number(value) {
            NativeNumber::Integer(i) => Value::Number(Number::from(i)),
            NativeNumber::Unsigned(u) => Value::Number(Number::from(u)),
            NativeNumber::Float(f) => Value::Number(Number::from(f)),
            NativeNumber::Text(text) => Value::String(text),
        }
    }

    fn deserialize_number(
        &self,
        element: &Value,
        _ty: &DecimalConfigType,
    ) -> std::result::Result<Decimal, DecodeError> {
        let parsed = match element {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Decimal::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Decimal::from(u))
                } else {
                    n.as_f64().and_then(|f| parse_decimal(&f.to_string()))
                }
            }
            Value::String(s) => parse_decimal(s),
            _ => return Err(wrong_shape(element, "number")),
        };
        parsed.ok_or_else(|| {
            DecodeError::new(format!("{element:?}"), "number", "not a representable decimal")
        })
    }

    fn serialize_string(&self, value: &str, _ty: &StringConfigType) -> Value {
        Value::String(value.to_string())
    }

    fn deserialize_string(
        &self,
        element: &Value,
        _ty: &StringConfigType,
    ) -> std::result::Result<String, DecodeError> {
        text_of(element)
    }

    fn serialize_enum(&self, value: &str, _ty: &EnumConfigType) -> Value {
        Value::String(value.to_string())
    }

    fn deserialize_enum(
        &self,
        element: &Value,
        _ty: &EnumConfigType,
    ) -> std::result::Result<String, DecodeError> {
        text_of(element)
    }

    fn serialize_list(&self, elements: Vec<Value>, _ty: &ListConfigType) -> Value {
        Value::Sequence(elements)
    }

    fn deserialize_list<'e>(
        &self,
        element: &'e Value,
        _ty: &ListConfigType,
    ) -> std::result::Result<Vec<&'e Value>, DecodeError> {
        element
            .as_sequence()
            .map(|items| items.iter().collect())
            .ok_or_else(|| wrong_shape(element, "sequence"))
    }

    fn serialize_map(&self, entries: Vec<(String, Value)>, _ty: &MapConfigType) -> Value {
        Value::Mapping(entries.into_iter().map(|(k, v)| (Value::String(k), v)).collect())
    }

    fn deserialize_map<'e>(
        &self,
        element: &'e Value,
        _ty: &MapConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element)
    }

    fn serialize_record(&self, fields: Vec<(String, Value)>, _ty: &RecordConfigType) -> Value {
        Value::Mapping(fields.into_iter().map(|(k, v)| (Value::String(k), v)).collect())
    }

    fn deserialize_record<'e>(
        &self,
        element: &'e Value,
        _ty: &RecordConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element)
    }

    fn new_target(&self) -> Mapping {
        Mapping::new()
    }

    fn add_element(&self, name: &str, element: Value, target: &mut Mapping, comment: Option<&str>) {
        if comment.is_some() {
            trace!("Dropping comment on '{name}', comments are not written to YAML");
        }
        target.insert(Value::String(name.to_string()), element);
    }

    fn add_sub_element(&self, name: &str, sub: Mapping, target: &mut Mapping, comment: Option<&str>) {
        self.add_element(name, Value::Mapping(sub), target, comment);
    }

    fn elements<'t>(&self, target: &'t Mapping) -> Vec<(&'t str, &'t Value)> {
        target
            .iter()
            .filter_map(|(key, value)| match key {
                Value::String(key) => Some((key.as_str(), value)),
                other => {
                    trace!("Skipping non-string key {other:?}");
                    None
                }
            })
            .collect()
    }

    fn sub_elements<'e>(&self, element: &'e Value) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element)
    }

    fn read_target(&self, reader: &mut dyn Read) -> Result<Mapping> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let value: Value = serde_yaml::from_str(&text).map_err(|e| {
            DecodeError::absent("YAML mapping", "Syntax error deserializing YAML").with_source(e)
        })?;
        match value {
            Value::Mapping(mapping) => Ok(mapping),
            // An empty document parses as null
            Value::Null => Ok(Mapping::new()),
            other => Err(Error::Decode(wrong_shape(&other, "mapping"))),
        }
    }

    fn write_target(&self, target: &Mapping, writer: &mut dyn Write) -> Result<()> {
        serde_yaml::to_writer(&mut *writer, target).map_err(|e| Error::Format {
            format: "YAML",
            reason: e.to_string(),
        })
    }
}
