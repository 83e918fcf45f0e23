//! AppSync generator: compiles a YAML API manifest into a resolved GraphQL
//! schema and renders the SDL, resolver and data-source artifacts for it.

pub mod context;
pub mod error;
pub mod manifest;
pub mod render;
pub mod schema;
pub mod settings;
pub mod template;

pub use context::GenerationContext;
pub use error::{
    AttributeError, ConfigError, DataSourceError, GenerateError, ManifestError, RenderError,
    SchemaError, ValidationError,
};
pub use manifest::{load, parse, Manifest};
pub use render::{generate, run, ArtifactSink, FsSink, GenerationReport, MemorySink};
pub use schema::{resolve, ResolvedSchema};
pub use settings::GeneratorConfig;
pub use template::{TemplateBinder, TemplateRoots};
