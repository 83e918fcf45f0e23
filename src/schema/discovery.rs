//! Resolver discovery and binding: attach parent context, resolve the data
//! source, check the action and template.

use crate::error::SchemaError;
use crate::manifest::{
    ArgsSource, DataSource, FieldType, Resolver, ResolverAction, ResolverBinding, ResolverStage,
    MUTATION_TYPE, QUERY_TYPE,
};
use crate::schema::ResolvedSchema;
use indexmap::IndexMap;

/// Data source used when a resolver names one that is not declared.
pub const DEFAULT_DATA_SOURCE: &str = "default";

/// Bind every resolver in the schema in place. Failures are collected into
/// `schema.errors`; the offending resolver stays unbound.
pub fn bind_resolvers(schema: &mut ResolvedSchema) {
    let ResolvedSchema {
        queries,
        mutations,
        objects,
        data_sources,
        errors,
        ..
    } = schema;
    let data_sources = &*data_sources;

    let mut record = |resolver: &mut Resolver, parent: &str, field: &str, return_type: FieldType| {
        if let Err(error) = bind_resolver(resolver, parent, field, return_type, data_sources) {
            tracing::warn!(%error, "resolver not bound");
            errors.push(error);
        }
    };

    for q in queries.iter_mut() {
        if let Some(r) = q.resolver.as_mut() {
            record(r, QUERY_TYPE, &q.name, q.return_type.clone());
        }
    }
    for m in mutations.iter_mut() {
        if let Some(r) = m.resolver.as_mut() {
            record(r, MUTATION_TYPE, &m.name, m.return_type.clone());
        }
    }
    for object in objects.values_mut() {
        for field in object.fields.iter_mut() {
            if let Some(r) = field.resolver.as_mut() {
                let return_type = r.return_type.clone().unwrap_or_default();
                record(r, &object.name, &field.name, return_type);
            }
        }
    }
}

/// Bind a single resolver. On success the resolver carries a
/// `ResolverBinding` and is `Bound`; on failure its stage records why.
pub fn bind_resolver(
    resolver: &mut Resolver,
    parent_type: &str,
    field_name: &str,
    return_type: FieldType,
    sources: &IndexMap<String, DataSource>,
) -> Result<(), SchemaError> {
    let unknown_source = || SchemaError::UnknownDataSource {
        parent: parent_type.to_string(),
        field: field_name.to_string(),
        requested: resolver.data_source_name.clone(),
    };
    let resolved = sources
        .get_key_value(resolver.data_source_name.as_str())
        .or_else(|| sources.get_key_value(DEFAULT_DATA_SOURCE))
        .and_then(|(key, ds)| ds.type_name().map(|t| (key.clone(), t)));
    let Some((data_source, data_source_type)) = resolved else {
        let error = unknown_source();
        resolver.stage = ResolverStage::Unbound;
        return Err(error);
    };

    let check = check_action(resolver, parent_type, field_name, &return_type);
    let (action, template) = match check {
        Ok(pair) => pair,
        Err(error) => {
            resolver.stage = ResolverStage::InvalidAction;
            return Err(error);
        }
    };

    if data_source != resolver.data_source_name {
        tracing::debug!(
            parent = parent_type,
            field = field_name,
            requested = %resolver.data_source_name,
            "falling back to default data source"
        );
    }

    resolver.template = Some(template.clone());
    resolver.binding = Some(ResolverBinding {
        parent_type: parent_type.to_string(),
        field_name: field_name.to_string(),
        args_source: ArgsSource::for_parent(parent_type),
        action,
        template,
        data_source,
        data_source_type,
        return_type,
    });
    resolver.stage = ResolverStage::Bound;
    tracing::debug!(resolver = %resolver, "resolver bound");
    Ok(())
}

/// Whitelisted action, custom-template rule and list cardinality. Returns the
/// action with its effective template name.
fn check_action(
    resolver: &Resolver,
    parent_type: &str,
    field_name: &str,
    return_type: &FieldType,
) -> Result<(ResolverAction, String), SchemaError> {
    let action =
        ResolverAction::parse(&resolver.action).ok_or_else(|| SchemaError::InvalidResolverAction {
            parent: parent_type.to_string(),
            field: field_name.to_string(),
            action: resolver.action.clone(),
        })?;

    let custom = resolver
        .template
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let conflict = |reason| SchemaError::TemplateTypeConflict {
        parent: parent_type.to_string(),
        field: field_name.to_string(),
        reason,
    };
    let template = match (action, custom) {
        (ResolverAction::Custom, Some(t)) => t.to_string(),
        (ResolverAction::Custom, None) => {
            return Err(conflict("must specify custom template when resolver action is 'custom'"))
        }
        (_, Some(_)) => {
            return Err(conflict(
                "must not specify a custom template when resolver action is not 'custom'",
            ))
        }
        (_, None) => action.as_str().to_string(),
    };

    check_cardinality(action, parent_type, field_name, return_type)?;
    Ok((action, template))
}

/// A `list` resolver must return a list type.
pub fn check_cardinality(
    action: ResolverAction,
    parent_type: &str,
    field_name: &str,
    return_type: &FieldType,
) -> Result<(), SchemaError> {
    if action == ResolverAction::List && !return_type.is_list {
        return Err(SchemaError::MismatchedResolverCardinality {
            parent: parent_type.to_string(),
            field: field_name.to_string(),
            return_type: return_type.shorthand(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DynamoSource;

    fn sources(names: &[&str]) -> IndexMap<String, DataSource> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    DataSource {
                        dynamo: Some(DynamoSource {
                            hash_key: "id".into(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn list_type() -> FieldType {
        FieldType::parse("[Animal]").unwrap()
    }

    #[test]
    fn binds_query_resolver() {
        let mut r = Resolver::new("AnimalTable", "list");
        bind_resolver(&mut r, "Query", "animals", list_type(), &sources(&["AnimalTable"])).unwrap();
        let b = r.binding.as_ref().unwrap();
        assert_eq!(b.parent_type, "Query");
        assert_eq!(b.field_name, "animals");
        assert_eq!(b.args_source, ArgsSource::Args);
        assert_eq!(b.template, "list");
        assert_eq!(b.data_source, "AnimalTable");
        assert_eq!(b.data_source_type, "dynamo");
        assert_eq!(r.template.as_deref(), Some("list"));
        assert_eq!(r.stage, ResolverStage::Bound);
    }

    #[test]
    fn object_field_reads_from_source() {
        let mut r = Resolver::new("AnimalTable", "get");
        bind_resolver(&mut r, "Person", "pet", FieldType::named("Animal"), &sources(&["AnimalTable"]))
            .unwrap();
        assert_eq!(r.binding.unwrap().args_source, ArgsSource::Source);
    }

    #[test]
    fn unknown_source_without_default_fails() {
        let mut r = Resolver::new("Unknown", "get");
        let err = bind_resolver(&mut r, "Query", "animal", FieldType::named("Animal"), &sources(&["AnimalTable"]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownDataSource {
                parent: "Query".into(),
                field: "animal".into(),
                requested: "Unknown".into(),
            }
        );
        assert_eq!(err.to_string(), "resolver 'Query_animal' has unknown data source 'Unknown'");
        assert_eq!(r.stage, ResolverStage::Unbound);
        assert!(r.binding.is_none());
    }

    #[test]
    fn unknown_source_falls_back_to_default() {
        let mut r = Resolver::new("Unknown", "get");
        bind_resolver(&mut r, "Query", "animal", FieldType::named("Animal"), &sources(&["default"]))
            .unwrap();
        assert_eq!(r.binding.unwrap().data_source, "default");
    }

    #[test]
    fn rejects_unknown_action() {
        let mut r = Resolver::new("default", "get-item");
        let err = bind_resolver(&mut r, "Query", "animal", FieldType::named("Animal"), &sources(&["default"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidResolverAction { ref action, .. } if action == "get-item"));
        assert_eq!(r.stage, ResolverStage::InvalidAction);
    }

    #[test]
    fn custom_requires_template() {
        let src = sources(&["default"]);
        let mut r = Resolver::new("default", "custom");
        let err = bind_resolver(&mut r, "Query", "a", FieldType::named("Animal"), &src).unwrap_err();
        assert!(matches!(err, SchemaError::TemplateTypeConflict { .. }));

        let mut r = Resolver::new("default", "custom");
        r.template = Some("my-template".into());
        bind_resolver(&mut r, "Query", "a", FieldType::named("Animal"), &src).unwrap();
        assert_eq!(r.binding.unwrap().template, "my-template");
    }

    #[test]
    fn standard_action_forbids_template() {
        let mut r = Resolver::new("default", "get");
        r.template = Some("my-template".into());
        let err = bind_resolver(&mut r, "Query", "a", FieldType::named("Animal"), &sources(&["default"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "resolver 'Query_a': must not specify a custom template when resolver action is not 'custom'"
        );
    }

    #[test]
    fn list_requires_list_return_type() {
        let mut r = Resolver::new("default", "list");
        let err = bind_resolver(&mut r, "Query", "animals", FieldType::named("Animal"), &sources(&["default"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MismatchedResolverCardinality { .. }));
    }
}
