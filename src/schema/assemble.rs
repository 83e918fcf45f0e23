//! Build the resolved schema from a parsed manifest.

use crate::error::SchemaError;
use crate::manifest::{Manifest, ResolverAction};
use crate::schema::derive::{filter_from_object, input_from_object, unfilterable_fields};
use crate::schema::discovery::bind_resolvers;
use crate::schema::{Object, ResolvedSchema, ResolverLocation};

/// One synthetic-type request raised by a bound resolver.
struct Derivation {
    action: ResolverAction,
    base: String,
    nested: bool,
    mutation: bool,
}

/// Compile a manifest into a resolved schema. Per-entity problems end up in
/// `errors` rather than aborting, so callers see the full set in one run.
pub fn resolve(manifest: Manifest) -> ResolvedSchema {
    let Manifest {
        api_name_suffix,
        enums,
        objects,
        queries,
        mutations,
        sources,
        ..
    } = manifest;

    let mut schema = ResolvedSchema {
        api_name: api_name_suffix,
        enums,
        objects: objects
            .into_iter()
            .map(|(name, fields)| (name.clone(), Object { name, fields }))
            .collect(),
        queries,
        mutations,
        data_sources: sources,
        ..Default::default()
    };

    bind_resolvers(&mut schema);
    derive_types(&mut schema);

    tracing::info!(
        api = %schema.api_name,
        resolvers = schema.bound_resolvers().count(),
        filters = schema.filter_objects.len(),
        inputs = schema.input_objects.len(),
        connections = schema.connections.len(),
        errors = schema.errors.len(),
        "schema resolved"
    );
    schema
}

/// Add filter, input and connection types requested by bound resolvers.
/// Each derived name is inserted once.
fn derive_types(schema: &mut ResolvedSchema) {
    let requests: Vec<Derivation> = schema
        .resolvers()
        .filter_map(|(location, r)| {
            let b = r.binding.as_ref()?;
            Some(Derivation {
                action: b.action,
                base: b.return_type.name.clone(),
                nested: b.is_nested(),
                mutation: matches!(location, ResolverLocation::Mutation(_)),
            })
        })
        .collect();

    for d in requests {
        match d.action {
            ResolverAction::List => add_filter(schema, &d),
            ResolverAction::Insert | ResolverAction::Update if d.mutation => add_input(schema, &d),
            _ => {}
        }
    }
}

fn add_filter(schema: &mut ResolvedSchema, d: &Derivation) {
    let Some(object) = schema.object(&d.base) else {
        schema.add_error(SchemaError::UnknownType {
            type_name: d.base.clone(),
            purpose: "filter",
        });
        return;
    };

    let filter = filter_from_object(object);
    let misspelt: Vec<SchemaError> = unfilterable_fields(object)
        .filter(|f| !schema.is_known_type(f.type_name()))
        .map(|f| SchemaError::UnknownFieldType {
            object: object.name.clone(),
            field: f.name.clone(),
            type_name: f.type_name().to_string(),
        })
        .collect();

    if !d.nested {
        schema.add_connection(&d.base);
    }
    if schema.add_filter(filter) {
        for error in misspelt {
            schema.add_error(error);
        }
    }
}

fn add_input(schema: &mut ResolvedSchema, d: &Derivation) {
    let Some(object) = schema.object(&d.base) else {
        schema.add_error(SchemaError::UnknownType {
            type_name: d.base.clone(),
            purpose: "input",
        });
        return;
    };
    match input_from_object(object, d.action) {
        Ok(input) => {
            schema.add_input(input);
        }
        Err(error) => schema.add_error(error),
    }
}
