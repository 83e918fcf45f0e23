//! Resolved schema model: manifest validated, resolvers bound and derived
//! types added, ready for rendering.

use crate::error::SchemaError;
use crate::manifest::{DataSource, Field, Operation, Resolver};
use indexmap::{IndexMap, IndexSet};

/// Object type. Field order is emission order.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub name: String,
    pub fields: Vec<Field>,
}

/// Synthesized filter input for list resolvers.
pub type FilterObject = Object;

/// Synthesized create/update input for mutations.
pub type InputObject = Object;

/// Where a resolver was declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolverLocation {
    Query(usize),
    Mutation(usize),
    ObjectField { object: String, field: usize },
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedSchema {
    pub api_name: String,
    pub enums: IndexMap<String, Vec<String>>,
    pub objects: IndexMap<String, Object>,
    pub queries: Vec<Operation>,
    pub mutations: Vec<Operation>,
    pub data_sources: IndexMap<String, DataSource>,
    pub filter_objects: IndexMap<String, FilterObject>,
    pub input_objects: IndexMap<String, InputObject>,
    /// Base type names that get an `XConnection` wrapper.
    pub connections: IndexSet<String>,
    /// Diagnostics gathered while compiling; the run succeeds only when empty.
    pub errors: Vec<SchemaError>,
}

impl ResolvedSchema {
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.get(name)
    }

    pub fn is_known_type(&self, name: &str) -> bool {
        self.objects.contains_key(name) || self.enums.contains_key(name)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every declared resolver: queries, then mutations, then object fields.
    pub fn resolvers(&self) -> impl Iterator<Item = (ResolverLocation, &Resolver)> + '_ {
        let queries = self
            .queries
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.resolver.as_ref().map(|r| (ResolverLocation::Query(i), r)));
        let mutations = self
            .mutations
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.resolver.as_ref().map(|r| (ResolverLocation::Mutation(i), r)));
        let fields = self.objects.values().flat_map(|o| {
            o.fields.iter().enumerate().filter_map(move |(i, f)| {
                f.resolver.as_ref().map(|r| {
                    (
                        ResolverLocation::ObjectField {
                            object: o.name.clone(),
                            field: i,
                        },
                        r,
                    )
                })
            })
        });
        queries.chain(mutations).chain(fields)
    }

    /// Resolvers that made it through binding.
    pub fn bound_resolvers(&self) -> impl Iterator<Item = &Resolver> + '_ {
        self.resolvers()
            .map(|(_, r)| r)
            .filter(|r| r.binding.is_some())
    }

    pub fn resolver_at(&self, location: &ResolverLocation) -> Option<&Resolver> {
        match location {
            ResolverLocation::Query(i) => self.queries.get(*i)?.resolver.as_ref(),
            ResolverLocation::Mutation(i) => self.mutations.get(*i)?.resolver.as_ref(),
            ResolverLocation::ObjectField { object, field } => {
                self.objects.get(object)?.fields.get(*field)?.resolver.as_ref()
            }
        }
    }

    /// Insert a filter object unless one with the same name exists. Returns
    /// whether it was new.
    pub fn add_filter(&mut self, filter: FilterObject) -> bool {
        if self.filter_objects.contains_key(&filter.name) {
            return false;
        }
        tracing::debug!(name = %filter.name, fields = filter.fields.len(), "filter object added");
        self.filter_objects.insert(filter.name.clone(), filter);
        true
    }

    pub fn add_input(&mut self, input: InputObject) -> bool {
        if self.input_objects.contains_key(&input.name) {
            return false;
        }
        tracing::debug!(name = %input.name, fields = input.fields.len(), "input object added");
        self.input_objects.insert(input.name.clone(), input);
        true
    }

    pub fn add_connection(&mut self, base: &str) -> bool {
        self.connections.insert(base.to_string())
    }

    pub fn add_error(&mut self, error: SchemaError) {
        tracing::warn!(%error, "schema error");
        self.errors.push(error);
    }
}
