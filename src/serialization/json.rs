//! JSON value serializer

use crate::error::{DecodeError, Error, Result};
use crate::schema::{
    BooleanConfigType, DecimalConfigType, EnumConfigType, ListConfigType, MapConfigType,
    RecordConfigType, StringConfigType,
};
use log::trace;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::io::{Read, Write};

use super::{NativeNumber, ValueSerializer, native_number, parse_decimal};

/// Reads and writes configuration as JSON objects.
///
/// JSON has no comments, so node comments are dropped on write. Numbers are
/// written natively when that keeps their exact value and as strings
/// otherwise; both forms are accepted on read.
#[derive(Debug, Clone)]
pub struct JsonValueSerializer {
    pretty: bool,
}

impl Default for JsonValueSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonValueSerializer {
    /// Pretty-printed output
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

fn wrong_shape(element: &Value, expected: &str) -> DecodeError {
    DecodeError::new(element, expected, format!("expected a JSON {expected}"))
}

fn entries<'e>(element: &'e Value, expected: &str) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
    element
        .as_object()
        .map(|object| object.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .ok_or_else(|| wrong_shape(element, expected))
}

pub(crate) fn decimal_to_json(value: Decimal) -> Value {
    match native_number(value) {
        NativeNumber::Integer(i) => Value::from(i),
        NativeNumber::Unsigned(u) => Value::from(u),
        NativeNumber::Float(f) => Number::from_f64(f).map_or_else(|| Value::String(value.to_string()), Value::Number),
        NativeNumber::Text(text) => Value::String(text),
    }
}

fn text_of(element: &Value, expected: &str) -> std::result::Result<String, DecodeError> {
    element
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_shape(element, expected))
}

impl ValueSerializer for JsonValueSerializer {
    type Element = Value;
    type Target = Map<String, Value>;

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
        decimal_to_json(value)
    }

    fn deserialize_number(
        &self,
        element: &Value,
        _ty: &DecimalConfigType,
    ) -> std::result::Result<Decimal, DecodeError> {
        let text = match element {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => return Err(wrong_shape(element, "number")),
        };
        parse_decimal(&text)
            .ok_or_else(|| DecodeError::new(element, "number", "not a representable decimal"))
    }

    fn serialize_string(&self, value: &str, _ty: &StringConfigType) -> Value {
        Value::String(value.to_string())
    }

    fn deserialize_string(
        &self,
        element: &Value,
        _ty: &StringConfigType,
    ) -> std::result::Result<String, DecodeError> {
        text_of(element, "string")
    }

    fn serialize_enum(&self, value: &str, _ty: &EnumConfigType) -> Value {
        Value::String(value.to_string())
    }

    fn deserialize_enum(
        &self,
        element: &Value,
        _ty: &EnumConfigType,
    ) -> std::result::Result<String, DecodeError> {
        text_of(element, "string")
    }

    fn serialize_list(&self, elements: Vec<Value>, _ty: &ListConfigType) -> Value {
        Value::Array(elements)
    }

    fn deserialize_list<'e>(
        &self,
        element: &'e Value,
        _ty: &ListConfigType,
    ) -> std::result::Result<Vec<&'e Value>, DecodeError> {
        element
            .as_array()
            .map(|items| items.iter().collect())
            .ok_or_else(|| wrong_shape(element, "array"))
    }

    fn serialize_map(&self, entries: Vec<(String, Value)>, _ty: &MapConfigType) -> Value {
        Value::Object(entries.into_iter().collect())
    }

    fn deserialize_map<'e>(
        &self,
        element: &'e Value,
        _ty: &MapConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "object")
    }

    fn serialize_record(&self, fields: Vec<(String, Value)>, _ty: &RecordConfigType) -> Value {
        Value::Object(fields.into_iter().collect())
    }

    fn deserialize_record<'e>(
        &self,
        element: &'e Value,
        _ty: &RecordConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "object")
    }

    fn new_target(&self) -> Map<String, Value> {
        Map::new()
    }

    fn add_element(&self, name: &str, element: Value, target: &mut Map<String, Value>, comment: Option<&str>) {
        if comment.is_some() {
            trace!("Dropping comment on '{name}', JSON has no comments");
        }
        target.insert(name.to_string(), element);
    }

    fn add_sub_element(
        &self,
        name: &str,
        sub: Map<String, Value>,
        target: &mut Map<String, Value>,
        comment: Option<&str>,
    ) {
        self.add_element(name, Value::Object(sub), target, comment);
    }

    fn elements<'t>(&self, target: &'t Map<String, Value>) -> Vec<(&'t str, &'t Value)> {
        target.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    fn sub_elements<'e>(&self, element: &'e Value) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "object")
    }

    fn read_target(&self, reader: &mut dyn Read) -> Result<Map<String, Value>> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            DecodeError::absent("JSON object", "Syntax error deserializing JSON").with_source(e)
        })?;
        match value {
            Value::Object(object) => Ok(object),
            other => Err(Error::Decode(DecodeError::new(
                &other,
                "JSON object",
                "top-level value is not an object",
            ))),
        }
    }

    fn write_target(&self, target: &Map<String, Value>, writer: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, target)?;
            writeln!(writer)?;
        } else {
            serde_json::to_writer(&mut *writer, target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConfigType, ConfigValue};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_numbers_keep_exact_value() {
        let s = JsonValueSerializer::new();
        let ty = ConfigType::from(DecimalConfigType::UNBOUNDED);

        let exact = ConfigValue::Number(dec!(12345678901234567890.5));
        let element = ty.serialize_value(&exact, &s).unwrap();
        assert!(element.is_string());
        assert_eq!(ty.deserialize_value(&element, &s).unwrap(), exact);

        assert_eq!(ty.serialize_value(&ConfigValue::from(7), &s).unwrap(), json!(7));
        assert_eq!(
            ty.deserialize_value(&json!(2.5), &s).unwrap(),
            ConfigValue::Number(dec!(2.5))
        );
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let s = JsonValueSerializer::new();
        let err = ConfigType::from(BooleanConfigType)
            .deserialize_value(&json!("true"), &s)
            .unwrap_err();
        assert_eq!(err.expected(), "boolean");
    }

    #[test]
    fn test_read_target_requires_object() {
        let s = JsonValueSerializer::new();
        let err = s.read_target(&mut "[1, 2]".as_bytes()).unwrap_err();
        assert!(err.is_decode_error());

        let err = s.read_target(&mut "{ broken".as_bytes()).unwrap_err();
        assert!(err.is_decode_error());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_compact_output_is_single_line() {
        let s = JsonValueSerializer::compact();
        let mut target = s.new_target();
        s.add_element("a", json!(1), &mut target, Some("ignored"));

        let mut out = Vec::new();
        s.write_target(&target, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":1}"#);
    }
}
