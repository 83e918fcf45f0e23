//! Typed errors, one enum per compilation tier.

use crate::manifest::SUPPORTED_MAJOR_VERSION;
use std::path::PathBuf;
use thiserror::Error;

/// Failures decoding a field type or a field declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("field has bad type definition, must be <type> or [<type>]")]
    BadTypeDefinition,
    #[error("field '{0}' cannot declare both a type and a resolver")]
    TypeAndResolver(String),
    #[error("fields must have a 'name' attribute")]
    MissingName,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("data source must declare exactly one of dynamo, sql or lambda (found {found})")]
    InvalidDataSourceVariant { found: usize },
    #[error("dynamo datasource must declare a hash_key")]
    MissingHashKey,
    #[error("sql datasource must declare a primary_key")]
    MissingPrimaryKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceDiagnostic {
    pub name: String,
    pub error: DataSourceError,
}

/// Every offending data source, collected in one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("errors found whilst validating data sources: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<DataSourceDiagnostic>,
}

fn summarize(errors: &[DataSourceDiagnostic]) -> String {
    errors
        .iter()
        .map(|d| format!("{}: {}", d.name, d.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fatal manifest errors. No partial schema survives any of these.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no valid 'version' found in manifest - must be in format 'v{major}.0.0'", major = SUPPORTED_MAJOR_VERSION)]
    MissingVersion,
    #[error(
        "manifest must be version >= {major}.0.0 and < {next}.0.0, got {found}",
        major = SUPPORTED_MAJOR_VERSION,
        next = SUPPORTED_MAJOR_VERSION + 1
    )]
    UnsupportedVersion { found: String },
    #[error("unable to parse manifest: {0}")]
    Decode(#[from] serde_yaml::Error),
    #[error("must supply apiNameSuffix")]
    MissingApiName,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-entity diagnostics gathered while building the schema. Compilation
/// carries on past each of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("resolver '{parent}_{field}' has unknown data source '{requested}'")]
    UnknownDataSource {
        parent: String,
        field: String,
        requested: String,
    },
    #[error("resolver '{parent}_{field}' specifies invalid action '{action}'")]
    InvalidResolverAction {
        parent: String,
        field: String,
        action: String,
    },
    #[error("resolver '{parent}_{field}': {reason}")]
    TemplateTypeConflict {
        parent: String,
        field: String,
        reason: &'static str,
    },
    #[error("resolver '{parent}_{field}' has action 'list' but returns non-list type '{return_type}'")]
    MismatchedResolverCardinality {
        parent: String,
        field: String,
        return_type: String,
    },
    #[error("unknown type '{type_name}' when attempting to create {purpose} object")]
    UnknownType {
        type_name: String,
        purpose: &'static str,
    },
    #[error("invalid action type for input object '{object}': {action}")]
    InvalidInputAction { object: String, action: String },
    #[error("field '{object}.{field}' has unrecognised type '{type_name}'")]
    UnknownFieldType {
        object: String,
        field: String,
        type_name: String,
    },
}

/// Render-phase failures, recorded per artifact.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template '{name}' not found in any template root")]
    TemplateMissing { name: String, searched: Vec<PathBuf> },
    #[error("template '{name}' is malformed: {message}")]
    TemplateSyntax { name: String, message: String },
    #[error("failed to execute template '{name}': {message}")]
    TemplateExecution { name: String, message: String },
    #[error("failed to read template '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("resolver '{0}' is not bound to a data source")]
    Unbound(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Bad or missing generator settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Top-level outcome of a generator run.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("{0} error(s) occurred during generation")]
    Generation(usize),
}
