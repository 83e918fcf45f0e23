//! Resolver declarations and the binding attached to them during discovery.

use crate::manifest::attribute::{Attribute, FieldType};
use crate::manifest::types::Field;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Parent type names for top-level resolvers.
pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";

/// Fixed whitelist of resolver actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolverAction {
    Get,
    List,
    Insert,
    Update,
    Delete,
    Custom,
}

impl ResolverAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get" => Some(ResolverAction::Get),
            "list" => Some(ResolverAction::List),
            "insert" => Some(ResolverAction::Insert),
            "update" => Some(ResolverAction::Update),
            "delete" => Some(ResolverAction::Delete),
            "custom" => Some(ResolverAction::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverAction::Get => "get",
            ResolverAction::List => "list",
            ResolverAction::Insert => "insert",
            ResolverAction::Update => "update",
            ResolverAction::Delete => "delete",
            ResolverAction::Custom => "custom",
        }
    }
}

impl fmt::Display for ResolverAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolver reads its key values from: call arguments for
/// Query/Mutation, the parent object instance otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgsSource {
    Args,
    Source,
}

impl ArgsSource {
    pub fn for_parent(parent_type: &str) -> Self {
        match parent_type {
            QUERY_TYPE | MUTATION_TYPE => ArgsSource::Args,
            _ => ArgsSource::Source,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgsSource::Args => "args",
            ArgsSource::Source => "source",
        }
    }
}

/// Per-resolver lifecycle. Discovery moves a resolver out of `Declared`;
/// rendering reports the later stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolverStage {
    #[default]
    Declared,
    Bound,
    TemplateSelected,
    Rendered,
    Unbound,
    InvalidAction,
    TemplateMissing,
}

/// Fields derived for a resolver while binding. Set exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolverBinding {
    pub parent_type: String,
    pub field_name: String,
    pub args_source: ArgsSource,
    pub action: ResolverAction,
    pub template: String,
    /// Key into the schema's data-source map (may be `default`).
    pub data_source: String,
    pub data_source_type: &'static str,
    pub return_type: FieldType,
}

impl ResolverBinding {
    /// Nested resolvers hang off a user object rather than Query/Mutation.
    pub fn is_nested(&self) -> bool {
        self.args_source == ArgsSource::Source
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Resolver {
    /// Must name a declared data source; falls back to `default`.
    #[serde(default, rename = "source")]
    pub data_source_name: String,
    pub action: String,
    #[serde(default, deserialize_with = "deserialize_key_fields")]
    pub key_fields: Vec<Field>,
    /// Only allowed (and required) when the action is `custom`.
    #[serde(default)]
    pub template: Option<String>,
    /// Return type for resolvers declared on object fields.
    #[serde(default, rename = "type")]
    pub return_type: Option<FieldType>,
    #[serde(default)]
    pub sort_descending: bool,

    #[serde(skip)]
    pub binding: Option<ResolverBinding>,
    #[serde(skip)]
    pub stage: ResolverStage,
}

impl Resolver {
    pub fn new(data_source_name: impl Into<String>, action: impl Into<String>) -> Self {
        Resolver {
            data_source_name: data_source_name.into(),
            action: action.into(),
            key_fields: Vec::new(),
            template: None,
            return_type: None,
            sort_descending: false,
            binding: None,
            stage: ResolverStage::Declared,
        }
    }

    /// `{"id":"ID","sort":"String"}`; non-null marks are dropped.
    pub fn key_field_json_map(&self) -> String {
        let map: IndexMap<&str, &str> = self
            .key_fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name()))
            .collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".into())
    }

    /// `["id","sort"]`
    pub fn key_field_json_list(&self) -> String {
        let names: Vec<&str> = self.key_fields.iter().map(|f| f.name.as_str()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".into())
    }

    /// Argument list for the SDL signature, empty when there is nothing to
    /// pass.
    pub fn argument_list(&self) -> String {
        let Some(binding) = &self.binding else {
            return String::new();
        };
        let type_name = &binding.return_type.name;
        match binding.action {
            ResolverAction::List => {
                format!("(filter: {}Filter, limit: Int, nextToken: String)", type_name)
            }
            ResolverAction::Insert => format!("(input: Create{}Input)", type_name),
            ResolverAction::Update => format!("(input: Update{}Input)", type_name),
            _ if self.key_fields.is_empty() => String::new(),
            _ => {
                let args: Vec<String> = self
                    .key_fields
                    .iter()
                    .map(|f| {
                        let ty = f.field_type.clone().unwrap_or_default();
                        format!("{}: {}", f.name, ty.shorthand())
                    })
                    .collect();
                format!("({})", args.join(", "))
            }
        }
    }

    /// SDL line for the field this resolver is attached to. Nested
    /// resolvers render as a plain field; top-level list resolvers return a
    /// connection.
    pub fn signature(&self) -> Option<String> {
        let binding = self.binding.as_ref()?;
        if binding.is_nested() {
            return Some(format!("{}: {}", binding.field_name, binding.return_type));
        }
        let returns = match binding.action {
            ResolverAction::List => format!("{}Connection!", binding.return_type.name),
            _ => binding.return_type.shorthand(),
        };
        Some(format!(
            "{}{}: {}",
            binding.field_name,
            self.argument_list(),
            returns
        ))
    }
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Some(b) => write!(f, "[{}] {} ({})", b.parent_type, b.field_name, b.template),
            None => write!(f, "[unbound] {} ({})", self.data_source_name, self.action),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyFieldEntry {
    Shorthand(String),
    Full(Field),
}

/// Key fields may be written as `name:Type` strings or full field mappings.
fn deserialize_key_fields<'de, D>(deserializer: D) -> Result<Vec<Field>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<KeyFieldEntry>>::deserialize(deserializer)?.unwrap_or_default();
    entries
        .into_iter()
        .map(|entry| match entry {
            KeyFieldEntry::Full(field) => Ok(field),
            KeyFieldEntry::Shorthand(s) => Attribute::parse(&s)
                .map(|a| Field::typed(a.name, a.field_type))
                .map_err(serde::de::Error::custom),
        })
        .collect()
}
