//! Template selection, compilation and caching, and per-resolver rendering.

use crate::error::RenderError;
use crate::manifest::{DataSource, Resolver, ResolverBinding, ResolverStage};
use crate::schema::check_cardinality;
use crate::template::compile::{compile, Partials, Template};
use crate::template::context::{resolver_identifier, DataSourceContext, ResolverContext};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared wrapper around the request/response fragments.
pub const WRAPPER_TEMPLATE: &str = "resolver.tmpl";
/// Per data-source-type template, under `<root>/<type>/`.
pub const DATASOURCE_TEMPLATE: &str = "datasource.tmpl";

const REQUEST_PARTIAL: &str = "request";
const RESPONSE_PARTIAL: &str = "response";

/// Cache key for a compiled resolver template set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub source_type: &'static str,
    pub template: String,
    pub nested: bool,
}

impl TemplateKey {
    pub fn for_binding(binding: &ResolverBinding) -> Self {
        TemplateKey {
            source_type: binding.data_source_type,
            template: binding.template.clone(),
            nested: binding.is_nested(),
        }
    }

    fn file_name(&self) -> String {
        let suffix = if self.nested { "-nested" } else { "" };
        format!("{}{}.tmpl", self.template, suffix)
    }

    /// `<type>/request/<template>[-nested].tmpl`
    pub fn request_path(&self) -> PathBuf {
        Path::new(self.source_type).join(REQUEST_PARTIAL).join(self.file_name())
    }

    /// `<type>/response/<template>[-nested].tmpl`
    pub fn response_path(&self) -> PathBuf {
        Path::new(self.source_type).join(RESPONSE_PARTIAL).join(self.file_name())
    }
}

/// Template directories, searched custom first.
#[derive(Clone, Debug)]
pub struct TemplateRoots {
    pub standard: PathBuf,
    pub custom: Option<PathBuf>,
}

impl TemplateRoots {
    pub fn new(standard: impl Into<PathBuf>, custom: Option<PathBuf>) -> Self {
        TemplateRoots {
            standard: standard.into(),
            custom,
        }
    }

    fn candidates(&self, relative: &Path) -> Vec<PathBuf> {
        self.custom
            .iter()
            .chain(std::iter::once(&self.standard))
            .map(|root| root.join(relative))
            .collect()
    }

    /// Read the first existing `relative` file across the roots.
    pub async fn read(&self, relative: &Path) -> Result<(PathBuf, String), RenderError> {
        let searched = self.candidates(relative);
        for path in &searched {
            match tokio::fs::read_to_string(path).await {
                Ok(text) => return Ok((path.clone(), text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(RenderError::Read {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Err(RenderError::TemplateMissing {
            name: relative.display().to_string(),
            searched,
        })
    }

    async fn compile(&self, relative: &Path) -> Result<Template, RenderError> {
        let (path, text) = self.read(relative).await?;
        let template = compile(&path.display().to_string(), &text)?;
        tracing::debug!(path = %path.display(), "template compiled");
        Ok(template)
    }
}

/// Wrapper plus its request/response partials, compiled once per key.
#[derive(Debug)]
pub struct ResolverTemplate {
    wrapper: Template,
    partials: Partials,
}

impl ResolverTemplate {
    fn partial(&self, name: &str) -> Result<&Template, RenderError> {
        self.partials.get(name).ok_or_else(|| RenderError::TemplateExecution {
            name: self.wrapper.name().to_string(),
            message: format!("missing partial '{}'", name),
        })
    }
}

/// Rendered resolver artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedResolver {
    pub identifier: String,
    pub signature: String,
    pub request: String,
    pub response: String,
    /// Wrapper output with both fragments included.
    pub text: String,
    pub output_name: String,
    pub stage: ResolverStage,
}

/// Rendered data-source artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedDataSource {
    pub identifier: String,
    pub text: String,
    pub output_name: String,
}

/// Stage a resolver ends in when rendering fails with `error`.
pub fn failed_stage(error: &RenderError) -> ResolverStage {
    match error {
        RenderError::Unbound(_) => ResolverStage::Unbound,
        RenderError::TemplateMissing { .. } => ResolverStage::TemplateMissing,
        RenderError::Schema(_) => ResolverStage::InvalidAction,
        _ => ResolverStage::TemplateSelected,
    }
}

/// Selects, compiles and caches templates. Safe to share across render
/// tasks: cache lookups hold the lock only briefly and never across file
/// reads.
#[derive(Debug)]
pub struct TemplateBinder {
    roots: TemplateRoots,
    extension: String,
    resolvers: Mutex<HashMap<TemplateKey, Arc<ResolverTemplate>>>,
    data_sources: Mutex<HashMap<&'static str, Arc<Template>>>,
}

impl TemplateBinder {
    pub fn new(roots: TemplateRoots, extension: impl Into<String>) -> Self {
        TemplateBinder {
            roots,
            extension: extension.into(),
            resolvers: Mutex::new(HashMap::new()),
            data_sources: Mutex::new(HashMap::new()),
        }
    }

    pub fn roots(&self) -> &TemplateRoots {
        &self.roots
    }

    /// Number of compiled resolver template sets.
    pub fn cached(&self) -> usize {
        self.resolvers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub async fn resolver_template(&self, key: &TemplateKey) -> Result<Arc<ResolverTemplate>, RenderError> {
        let cached = self
            .resolvers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let wrapper = self.roots.compile(Path::new(WRAPPER_TEMPLATE)).await?;
        let request = self.roots.compile(&key.request_path()).await?;
        let response = self.roots.compile(&key.response_path()).await?;
        let mut partials = Partials::new();
        partials.insert(REQUEST_PARTIAL.to_string(), request);
        partials.insert(RESPONSE_PARTIAL.to_string(), response);
        let compiled = Arc::new(ResolverTemplate { wrapper, partials });

        let mut cache = self.resolvers.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key.clone()).or_insert(compiled)))
    }

    async fn data_source_template(&self, source_type: &'static str) -> Result<Arc<Template>, RenderError> {
        let cached = self
            .data_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source_type)
            .cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let compiled = Arc::new(
            self.roots
                .compile(&Path::new(source_type).join(DATASOURCE_TEMPLATE))
                .await?,
        );
        let mut cache = self.data_sources.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(source_type).or_insert(compiled)))
    }

    /// Render one bound resolver: select its template set, build the data
    /// context and execute wrapper, request and response.
    pub async fn bind(
        &self,
        api_name: &str,
        resolver: &Resolver,
        sources: &IndexMap<String, DataSource>,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedResolver, RenderError> {
        let binding = resolver
            .binding
            .as_ref()
            .ok_or_else(|| RenderError::Unbound(resolver.to_string()))?;
        check_cardinality(
            binding.action,
            &binding.parent_type,
            &binding.field_name,
            &binding.return_type,
        )?;
        let data_source = sources
            .get(&binding.data_source)
            .and_then(|ds| DataSourceContext::new(&binding.data_source, ds))
            .ok_or_else(|| RenderError::Unbound(resolver.to_string()))?;

        let key = TemplateKey::for_binding(binding);
        let template = self.resolver_template(&key).await?;
        tracing::debug!(resolver = %resolver, template = ?key, "template selected");

        let context = ResolverContext::new(api_name, resolver, binding, data_source, generated_at);
        let value = serde_json::to_value(&context).map_err(|e| RenderError::TemplateExecution {
            name: template.wrapper.name().to_string(),
            message: e.to_string(),
        })?;

        let request = template.partial(REQUEST_PARTIAL)?.render(&value, &template.partials)?;
        let response = template.partial(RESPONSE_PARTIAL)?.render(&value, &template.partials)?;
        let text = template.wrapper.render(&value, &template.partials)?;

        let identifier = resolver_identifier(binding);
        Ok(RenderedResolver {
            output_name: format!("_{}.{}", identifier, self.extension),
            identifier,
            signature: context.signature,
            request,
            response,
            text,
            stage: ResolverStage::Rendered,
        })
    }

    /// Render the infrastructure fragment for one declared data source.
    pub async fn render_data_source(
        &self,
        api_name: &str,
        name: &str,
        source: &DataSource,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDataSource, RenderError> {
        let context = DataSourceContext::new(name, source).ok_or_else(|| RenderError::Unbound(name.to_string()))?;
        let template = self.data_source_template(context.source_type).await?;
        let value = serde_json::json!({
            "apiName": api_name,
            "dataSource": &context,
            "generatedAt": generated_at,
        });
        let text = template.render(&value, &Partials::new())?;
        Ok(RenderedDataSource {
            output_name: format!("_datasource_{}.{}", context.identifier, self.extension),
            identifier: context.identifier,
            text,
        })
    }
}
