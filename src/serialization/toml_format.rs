//! TOML value serializer

use crate::error::{DecodeError, Error, Result};
use crate::schema::{
    BooleanConfigType, DecimalConfigType, EnumConfigType, ListConfigType, MapConfigType,
    RecordConfigType, StringConfigType,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io::{Read, Write};
use toml::{Table, Value};

use super::{NativeNumber, ValueSerializer, native_number, parse_decimal};

/// Reads and writes configuration as TOML documents.
///
/// Subtrees become `[section]` tables and node comments are written as `#`
/// lines above their key or section header. Map and record values are
/// written as inline tables. Numbers outside the range TOML integers and
/// floats can hold exactly are written as strings.
#[derive(Debug, Clone)]
pub struct TomlValueSerializer {
    pretty: bool,
}

impl Default for TomlValueSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl TomlValueSerializer {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// No blank lines between sections
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

// =============================================================================
// Document
// =============================================================================

/// A TOML table plus the comments and sections it is written with.
///
/// Documents read from text carry no layout; writing one back puts every
/// value on a single `key = value` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomlDocument {
    table: Table,
    layout: Layout,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Layout {
    comments: BTreeMap<String, String>,
    sections: BTreeMap<String, Layout>,
}

impl TomlDocument {
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Comment attached to the entry `name`
    pub fn comment(&self, name: &str) -> Option<&str> {
        self.layout.comments.get(name).map(String::as_str)
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

impl From<Table> for TomlDocument {
    fn from(table: Table) -> Self {
        Self {
            table,
            layout: Layout::default(),
        }
    }
}

fn is_bare_key(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn key(name: &str) -> String {
    if is_bare_key(name) {
        name.to_string()
    } else {
        Value::String(name.to_string()).to_string()
    }
}

fn write_comment(out: &mut String, comment: Option<&String>) -> fmt::Result {
    if let Some(comment) = comment {
        for line in comment.lines() {
            writeln!(out, "# {line}")?;
        }
    }
    Ok(())
}

// Values first, then sections: a key after a header would land in that section
fn render(out: &mut String, table: &Table, layout: &Layout, path: &mut Vec<String>, pretty: bool) -> fmt::Result {
    for (name, value) in table {
        if layout.sections.contains_key(name) {
            continue;
        }
        write_comment(out, layout.comments.get(name))?;
        writeln!(out, "{} = {value}", key(name))?;
    }
    for (name, section) in &layout.sections {
        let Some(Value::Table(sub)) = table.get(name) else {
            continue;
        };
        if pretty && !out.is_empty() {
            out.push('\n');
        }
        write_comment(out, layout.comments.get(name))?;
        path.push(key(name));
        writeln!(out, "[{}]", path.join("."))?;
        render(out, sub, section, path, pretty)?;
        path.pop();
    }
    Ok(())
}

fn wrong_shape(element: &Value, expected: &str) -> DecodeError {
    DecodeError::new(element, expected, format!("expected a TOML {expected}"))
}

fn entries<'e>(element: &'e Value, expected: &str) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
    element
        .as_table()
        .map(|table| table.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .ok_or_else(|| wrong_shape(element, expected))
}

fn text_of(element: &Value) -> std::result::Result<String, DecodeError> {
    element
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_shape(element, "string"))
}

impl ValueSerializer for TomlValueSerializer {
    type Element = Value;
    type Target = TomlDocument;

    fn serialize_boolean(&self, value: bool, _ty: &BooleanConfigType) -> Value {
        Value::Boolean(value)
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
            NativeNumber::Integer(i) => Value::Integer(i),
            NativeNumber::Float(f) => Value::Float(f),
            NativeNumber::Unsigned(u) => Value::String(u.to_string()),
            NativeNumber::Text(text) => Value::String(text),
        }
    }

    fn deserialize_number(
        &self,
        element: &Value,
        _ty: &DecimalConfigType,
    ) -> std::result::Result<Decimal, DecodeError> {
        let parsed = match element {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Float(f) => parse_decimal(&f.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => return Err(wrong_shape(element, "number")),
        };
        parsed.ok_or_else(|| DecodeError::new(element, "number", "not a representable decimal"))
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
        Value::Table(entries.into_iter().collect())
    }

    fn deserialize_map<'e>(
        &self,
        element: &'e Value,
        _ty: &MapConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "table")
    }

    fn serialize_record(&self, fields: Vec<(String, Value)>, _ty: &RecordConfigType) -> Value {
        Value::Table(fields.into_iter().collect())
    }

    fn deserialize_record<'e>(
        &self,
        element: &'e Value,
        _ty: &RecordConfigType,
    ) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "table")
    }

    fn new_target(&self) -> TomlDocument {
        TomlDocument::default()
    }

    fn add_element(&self, name: &str, element: Value, target: &mut TomlDocument, comment: Option<&str>) {
        target.layout.sections.remove(name);
        match comment {
            Some(comment) => target.layout.comments.insert(name.to_string(), comment.to_string()),
            None => target.layout.comments.remove(name),
        };
        target.table.insert(name.to_string(), element);
    }

    fn add_sub_element(&self, name: &str, sub: TomlDocument, target: &mut TomlDocument, comment: Option<&str>) {
        self.add_element(name, Value::Table(sub.table), target, comment);
        target.layout.sections.insert(name.to_string(), sub.layout);
    }

    fn elements<'t>(&self, target: &'t TomlDocument) -> Vec<(&'t str, &'t Value)> {
        target.table.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    fn sub_elements<'e>(&self, element: &'e Value) -> std::result::Result<Vec<(&'e str, &'e Value)>, DecodeError> {
        entries(element, "table")
    }

    fn read_target(&self, reader: &mut dyn Read) -> Result<TomlDocument> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        toml::from_str::<Table>(&text).map(TomlDocument::from).map_err(|e| {
            Error::Decode(DecodeError::absent("TOML table", "Syntax error deserializing TOML").with_source(e))
        })
    }

    fn write_target(&self, target: &TomlDocument, writer: &mut dyn Write) -> Result<()> {
        let mut text = String::new();
        render(&mut text, &target.table, &target.layout, &mut Vec::new(), self.pretty).map_err(|e| {
            Error::Format {
                format: "TOML",
                reason: e.to_string(),
            }
        })?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}
