//! Raw manifest types matching the YAML layout.

use crate::error::AttributeError;
use crate::manifest::attribute::{attribute_name, attribute_type, FieldType};
use crate::manifest::resolver::Resolver;
use indexmap::IndexMap;
use serde::Deserialize;

/// Parsed manifest. Read-only once loaded, apart from resolver nodes which
/// discovery binds in place.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub api_name_suffix: String,
    #[serde(default)]
    pub enums: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub objects: IndexMap<String, Vec<Field>>,
    #[serde(default)]
    pub queries: Vec<Operation>,
    #[serde(default)]
    pub mutations: Vec<Operation>,
    #[serde(default)]
    pub sources: IndexMap<String, DataSource>,
}

/// Object field. Exactly one of `field_type` or `resolver` is set.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub struct Field {
    pub name: String,
    pub field_type: Option<FieldType>,
    pub resolver: Option<Resolver>,
    /// Type to use when the field is copied into an input object.
    pub input_type: Option<FieldType>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawField {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    field_type: Option<FieldType>,
    #[serde(default)]
    resolver: Option<Resolver>,
    #[serde(default)]
    input_type: Option<FieldType>,
}

impl TryFrom<RawField> for Field {
    type Error = AttributeError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err(AttributeError::MissingName);
        }
        let field_type = match (&raw.resolver, raw.field_type) {
            (Some(_), Some(_)) => return Err(AttributeError::TypeAndResolver(raw.name)),
            (Some(_), None) => None,
            (None, ty) => Some(ty.unwrap_or_default()),
        };
        Ok(Field {
            name: raw.name,
            field_type,
            resolver: raw.resolver,
            input_type: raw.input_type,
        })
    }
}

impl Field {
    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type: Some(field_type),
            resolver: None,
            input_type: None,
        }
    }

    /// Declared type name, or the resolver's return type name for resolver
    /// fields.
    pub fn type_name(&self) -> &str {
        self.field_type
            .as_ref()
            .or_else(|| self.resolver.as_ref().and_then(|r| r.return_type.as_ref()))
            .map(|t| t.name.as_str())
            .unwrap_or(crate::manifest::DEFAULT_FIELD_TYPE)
    }
}

/// A query or mutation entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operation {
    pub name: String,
    #[serde(default, rename = "type")]
    pub return_type: FieldType,
    #[serde(default)]
    pub resolver: Option<Resolver>,
}

impl Operation {
    /// SDL line: the resolver's signature when bound, `name: Type` otherwise.
    pub fn signature(&self) -> String {
        self.resolver
            .as_ref()
            .and_then(Resolver::signature)
            .unwrap_or_else(|| format!("{}: {}", self.name, self.return_type))
    }
}

/// Data source declaration. Exactly one variant must be populated; see
/// `validate_data_sources`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSource {
    #[serde(default)]
    pub dynamo: Option<DynamoSource>,
    #[serde(default)]
    pub sql: Option<SqlSource>,
    #[serde(default)]
    pub lambda: Option<LambdaSource>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamoSource {
    /// `<field>[:<type>]`, type defaults to `S`.
    #[serde(default, alias = "hashKey")]
    pub hash_key: String,
    #[serde(default, alias = "sortKey")]
    pub sort_key: Option<String>,
    #[serde(default, alias = "disableBackup")]
    pub disable_backup: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlSource {
    #[serde(default, alias = "primaryKey")]
    pub primary_key: String,
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LambdaSource {
    #[serde(default, alias = "functionName")]
    pub function_name: Option<String>,
    #[serde(default, alias = "functionArn")]
    pub function_arn: Option<String>,
}

/// Borrowed view of the populated variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DataSourceVariant<'a> {
    Dynamo(&'a DynamoSource),
    Sql(&'a SqlSource),
    Lambda(&'a LambdaSource),
}

impl DataSourceVariant<'_> {
    /// Type tag used in template paths.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataSourceVariant::Dynamo(_) => "dynamo",
            DataSourceVariant::Sql(_) => "sql",
            DataSourceVariant::Lambda(_) => "lambda",
        }
    }
}

impl DataSource {
    pub fn variant_count(&self) -> usize {
        [self.dynamo.is_some(), self.sql.is_some(), self.lambda.is_some()]
            .into_iter()
            .filter(|populated| *populated)
            .count()
    }

    /// The populated variant, or None unless exactly one is set.
    pub fn variant(&self) -> Option<DataSourceVariant<'_>> {
        match (&self.dynamo, &self.sql, &self.lambda) {
            (Some(d), None, None) => Some(DataSourceVariant::Dynamo(d)),
            (None, Some(s), None) => Some(DataSourceVariant::Sql(s)),
            (None, None, Some(l)) => Some(DataSourceVariant::Lambda(l)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.variant().map(|v| v.type_name())
    }
}

/// Lower-cased name with `_` and `-` stripped, safe as a resource identifier.
pub fn source_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Dynamo key attribute: field name plus Dynamo attribute type.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DynamoKey {
    pub field: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
}

impl DynamoKey {
    pub fn parse(attr: &str) -> Option<Self> {
        let field = attribute_name(attr);
        if field.is_empty() {
            return None;
        }
        Some(DynamoKey {
            field: field.to_string(),
            attribute_type: attribute_type(attr, "S").to_string(),
        })
    }
}

impl DynamoSource {
    pub fn hash_key(&self) -> Option<DynamoKey> {
        DynamoKey::parse(&self.hash_key)
    }

    pub fn sort_key(&self) -> Option<DynamoKey> {
        self.sort_key.as_deref().and_then(DynamoKey::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_defaults_to_string() {
        let f: Field = serde_yaml::from_str("name: subject").unwrap();
        assert_eq!(f.field_type, Some(FieldType::named("String")));
        assert!(f.resolver.is_none());
    }

    #[test]
    fn field_with_input_type_override() {
        let f: Field = serde_yaml::from_str("name: owner\ntype: Person\ninputType: ID").unwrap();
        assert_eq!(f.field_type, Some(FieldType::named("Person")));
        assert_eq!(f.input_type, Some(FieldType::named("ID")));
    }

    #[test]
    fn field_with_resolver_has_no_type() {
        let f: Field =
            serde_yaml::from_str("name: pets\nresolver:\n  action: list\n  type: [Animal]\n").unwrap();
        assert!(f.field_type.is_none());
        assert_eq!(f.type_name(), "Animal");
    }

    #[test]
    fn field_rejects_type_and_resolver() {
        let err = serde_yaml::from_str::<Field>("name: bad\ntype: String\nresolver:\n  action: get\n")
            .unwrap_err();
        assert!(err.to_string().contains("cannot declare both a type and a resolver"));
    }

    #[test]
    fn field_rejects_unknown_keys() {
        assert!(serde_yaml::from_str::<Field>("name: bad\nnullable: true").is_err());
    }

    #[test]
    fn data_source_variants() {
        let ds: DataSource = serde_yaml::from_str("dynamo:\n  hashKey: id:S\n  sort_key: created:N").unwrap();
        assert_eq!(ds.type_name(), Some("dynamo"));
        let dynamo = ds.dynamo.as_ref().unwrap();
        assert_eq!(
            dynamo.hash_key(),
            Some(DynamoKey { field: "id".into(), attribute_type: "S".into() })
        );
        assert_eq!(dynamo.sort_key().unwrap().attribute_type, "N");

        let both: DataSource =
            serde_yaml::from_str("sql:\n  primary_key: id\nlambda:\n  function_name: f").unwrap();
        assert_eq!(both.variant_count(), 2);
        assert!(both.variant().is_none());
    }

    #[test]
    fn empty_key_type_falls_back_to_string() {
        let ds: DataSource = serde_yaml::from_str("dynamo:\n  hash_key: 'id:'\n  sort_key: 'born: '").unwrap();
        let dynamo = ds.dynamo.as_ref().unwrap();
        assert_eq!(
            dynamo.hash_key(),
            Some(DynamoKey { field: "id".into(), attribute_type: "S".into() })
        );
        assert_eq!(dynamo.sort_key().unwrap().attribute_type, "S");
    }

    #[test]
    fn identifiers_strip_separators() {
        assert_eq!(source_identifier("Animal_Table-v2"), "animaltablev2");
    }
}
