pub mod binder;
pub mod compile;
pub mod context;

pub use binder::{
    failed_stage, RenderedDataSource, RenderedResolver, TemplateBinder, TemplateKey, TemplateRoots,
    DATASOURCE_TEMPLATE, WRAPPER_TEMPLATE,
};
pub use compile::{compile, Partials, Template};
pub use context::{resolver_identifier, DataSourceContext, ResolverContext};
