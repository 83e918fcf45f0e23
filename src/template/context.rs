//! Data contexts handed to mapping templates. Serialized to JSON, so the
//! camelCase field names here are the names templates refer to.

use crate::manifest::{source_identifier, DataSource, DataSourceVariant, DynamoKey, Resolver, ResolverBinding};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a data-source template can see about one declared source.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceContext {
    pub name: String,
    pub identifier: String,
    #[serde(rename = "type")]
    pub source_type: &'static str,
    pub hash_key: Option<DynamoKey>,
    pub sort_key: Option<DynamoKey>,
    pub disable_backup: bool,
    pub primary_key: Option<String>,
    pub database: Option<String>,
    pub function_name: Option<String>,
    pub function_arn: Option<String>,
}

impl DataSourceContext {
    /// None when the source does not have exactly one variant.
    pub fn new(name: &str, source: &DataSource) -> Option<Self> {
        let variant = source.variant()?;
        let mut ctx = DataSourceContext {
            name: name.to_string(),
            identifier: source_identifier(name),
            source_type: variant.type_name(),
            hash_key: None,
            sort_key: None,
            disable_backup: false,
            primary_key: None,
            database: None,
            function_name: None,
            function_arn: None,
        };
        match variant {
            DataSourceVariant::Dynamo(d) => {
                ctx.hash_key = d.hash_key();
                ctx.sort_key = d.sort_key();
                ctx.disable_backup = d.disable_backup;
            }
            DataSourceVariant::Sql(s) => {
                ctx.primary_key = Some(s.primary_key.clone());
                ctx.database = s.database.clone();
            }
            DataSourceVariant::Lambda(l) => {
                ctx.function_name = l.function_name.clone();
                ctx.function_arn = l.function_arn.clone();
            }
        }
        Some(ctx)
    }
}

/// Per-resolver data context for the wrapper, request and response
/// templates.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverContext {
    pub api_name: String,
    pub identifier: String,
    pub signature: String,
    pub parent_type: String,
    pub field_name: String,
    pub action: &'static str,
    pub template: String,
    pub args_source: &'static str,
    pub return_type: String,
    pub is_nested: bool,
    pub is_list: bool,
    /// JSON text, e.g. `{"id":"ID"}`.
    pub key_fields_map: String,
    /// JSON text, e.g. `["id"]`.
    pub key_fields_list: String,
    pub sort_descending: bool,
    pub scan_index_forward: bool,
    pub hash_key: String,
    pub sort_key: String,
    /// First key field of a nested resolver; the parent attribute to read.
    pub parent_key: String,
    pub data_source: DataSourceContext,
    pub generated_at: DateTime<Utc>,
}

impl ResolverContext {
    pub fn new(
        api_name: &str,
        resolver: &Resolver,
        binding: &ResolverBinding,
        data_source: DataSourceContext,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let key_name = |k: &Option<DynamoKey>| k.as_ref().map(|k| k.field.clone()).unwrap_or_default();
        let parent_key = if binding.is_nested() {
            resolver.key_fields.first().map(|f| f.name.clone()).unwrap_or_default()
        } else {
            String::new()
        };
        ResolverContext {
            api_name: api_name.to_string(),
            identifier: resolver_identifier(binding),
            signature: resolver.signature().unwrap_or_default(),
            parent_type: binding.parent_type.clone(),
            field_name: binding.field_name.clone(),
            action: binding.action.as_str(),
            template: binding.template.clone(),
            args_source: binding.args_source.as_str(),
            return_type: binding.return_type.shorthand(),
            is_nested: binding.is_nested(),
            is_list: binding.return_type.is_list,
            key_fields_map: resolver.key_field_json_map(),
            key_fields_list: resolver.key_field_json_list(),
            sort_descending: resolver.sort_descending,
            scan_index_forward: !resolver.sort_descending,
            hash_key: key_name(&data_source.hash_key),
            sort_key: key_name(&data_source.sort_key),
            parent_key,
            data_source,
            generated_at,
        }
    }
}

/// `<parent>_<field>` lower-cased; used for resource names and file names.
pub fn resolver_identifier(binding: &ResolverBinding) -> String {
    format!("{}_{}", binding.parent_type, binding.field_name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ArgsSource, DynamoSource, Field, FieldType, LambdaSource, ResolverAction};
    use chrono::TimeZone;

    fn dynamo() -> DataSource {
        DataSource {
            dynamo: Some(DynamoSource {
                hash_key: "id".into(),
                sort_key: Some("created:N".into()),
                disable_backup: true,
            }),
            ..Default::default()
        }
    }

    fn binding(parent: &str, action: ResolverAction) -> ResolverBinding {
        ResolverBinding {
            parent_type: parent.into(),
            field_name: "pets".into(),
            args_source: ArgsSource::for_parent(parent),
            action,
            template: action.as_str().into(),
            data_source: "Animal_Table".into(),
            data_source_type: "dynamo",
            return_type: FieldType::parse("[Animal]").unwrap(),
        }
    }

    #[test]
    fn data_source_context_per_variant() {
        let ctx = DataSourceContext::new("Animal_Table", &dynamo()).unwrap();
        assert_eq!(ctx.identifier, "animaltable");
        assert_eq!(ctx.source_type, "dynamo");
        assert_eq!(ctx.hash_key.as_ref().unwrap().attribute_type, "S");
        assert_eq!(ctx.sort_key.as_ref().unwrap().attribute_type, "N");
        assert!(ctx.disable_backup);

        let lambda = DataSource {
            lambda: Some(LambdaSource {
                function_name: Some("zoo-fn".into()),
                function_arn: None,
            }),
            ..Default::default()
        };
        let ctx = DataSourceContext::new("zoo", &lambda).unwrap();
        assert_eq!(ctx.function_name.as_deref(), Some("zoo-fn"));
        assert!(ctx.hash_key.is_none());

        assert!(DataSourceContext::new("empty", &DataSource::default()).is_none());
    }

    #[test]
    fn resolver_context_serializes_camel_case() {
        let mut resolver = Resolver::new("Animal_Table", "list");
        resolver.key_fields = vec![Field::typed("ownerId", FieldType::parse("ID!").unwrap())];
        resolver.sort_descending = true;
        let b = binding("Person", ResolverAction::List);
        resolver.binding = Some(b.clone());

        let ds = DataSourceContext::new("Animal_Table", &dynamo()).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ctx = ResolverContext::new("zoo", &resolver, &b, ds, at);
        let json = serde_json::to_value(&ctx).unwrap();

        assert_eq!(json["identifier"], "person_pets");
        assert_eq!(json["argsSource"], "source");
        assert_eq!(json["isNested"], true);
        assert_eq!(json["parentKey"], "ownerId");
        assert_eq!(json["hashKey"], "id");
        assert_eq!(json["sortKey"], "created");
        assert_eq!(json["scanIndexForward"], false);
        assert_eq!(json["keyFieldsMap"], r#"{"ownerId":"ID"}"#);
        assert_eq!(json["dataSource"]["type"], "dynamo");
        assert_eq!(json["dataSource"]["hashKey"]["field"], "id");
        assert_eq!(json["signature"], "pets: [Animal]");
    }

    #[test]
    fn top_level_resolver_has_no_parent_key() {
        let mut resolver = Resolver::new("Animal_Table", "get");
        resolver.key_fields = vec![Field::typed("id", FieldType::parse("ID!").unwrap())];
        let b = binding("Query", ResolverAction::Get);
        let ds = DataSourceContext::new("Animal_Table", &dynamo()).unwrap();
        let ctx = ResolverContext::new("zoo", &resolver, &b, ds, Utc::now());
        assert_eq!(ctx.parent_key, "");
        assert_eq!(ctx.args_source, "args");
        assert!(ctx.scan_index_forward);
    }
}
