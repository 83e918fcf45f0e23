//! Field type shorthand: `Type`, `Type!`, `[Type]`, `[Type!]` and the
//! `name[:Type]` attribute form.

use crate::error::AttributeError;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::fmt;
use std::sync::LazyLock;

/// Scalar type given to fields that declare no type.
pub const DEFAULT_FIELD_TYPE: &str = "String";

static TYPE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("Invalid type name regex"));

/// Semantic type of a field. `name` never keeps a trailing `!` or the
/// surrounding `[]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub name: String,
    pub is_list: bool,
    pub non_nullable: bool,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::named(DEFAULT_FIELD_TYPE)
    }
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType {
            name: name.into(),
            is_list: false,
            non_nullable: false,
        }
    }

    /// Decode a raw manifest value: null, a scalar string, or a one-element
    /// sequence holding a string. Anything else is rejected.
    pub fn decode(value: &Value) -> Result<Self, AttributeError> {
        match value {
            Value::Null => Ok(FieldType::default()),
            Value::String(s) => FieldType::parse(s),
            Value::Sequence(items) => match items.as_slice() {
                [Value::String(s)] => {
                    let mut ft = FieldType::parse(s)?;
                    if ft.is_list {
                        return Err(AttributeError::BadTypeDefinition);
                    }
                    ft.is_list = true;
                    Ok(ft)
                }
                _ => Err(AttributeError::BadTypeDefinition),
            },
            _ => Err(AttributeError::BadTypeDefinition),
        }
    }

    /// Parse textual shorthand. `[String!]` -> list of non-nullable String.
    /// Nullability is tracked once, on the element, so `[String]!` is rejected.
    pub fn parse(s: &str) -> Result<Self, AttributeError> {
        let mut text = s.trim();
        let mut is_list = false;
        if text.starts_with('[') {
            text = text
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .ok_or(AttributeError::BadTypeDefinition)?
                .trim();
            is_list = true;
        }
        let mut non_nullable = false;
        if let Some(rest) = text.strip_suffix('!') {
            text = rest.trim_end();
            non_nullable = true;
        }
        if !TYPE_NAME_REGEX.is_match(text) {
            return Err(AttributeError::BadTypeDefinition);
        }
        Ok(FieldType {
            name: text.to_string(),
            is_list,
            non_nullable,
        })
    }

    /// Re-encode as shorthand; `parse(ft.shorthand()) == ft`.
    pub fn shorthand(&self) -> String {
        let bang = if self.non_nullable { "!" } else { "" };
        if self.is_list {
            format!("[{}{}]", self.name, bang)
        } else {
            format!("{}{}", self.name, bang)
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shorthand())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        FieldType::decode(&v).map_err(serde::de::Error::custom)
    }
}

/// `name[:Type]` attribute, e.g. `id:ID!` or `reference`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub field_type: FieldType,
}

impl Attribute {
    pub fn parse(attr: &str) -> Result<Self, AttributeError> {
        let (name, field_type) = match attr.split_once(':') {
            Some((name, ty)) => (name.trim(), FieldType::parse(ty)?),
            None => (attr.trim(), FieldType::default()),
        };
        if name.is_empty() {
            return Err(AttributeError::MissingName);
        }
        Ok(Attribute {
            name: name.to_string(),
            field_type,
        })
    }
}

/// Name portion of a `name[:type]` attribute.
pub fn attribute_name(attr: &str) -> &str {
    attr.split_once(':').map(|(n, _)| n).unwrap_or(attr).trim()
}

/// Type portion of a `name[:type]` attribute, or `default` when absent or empty.
pub fn attribute_type<'a>(attr: &'a str, default: &'a str) -> &'a str {
    attr.split_once(':')
        .map(|(_, t)| t.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(default)
}
