//! Render fan-out: one task per artifact, bounded by the configured
//! concurrency, results collected into a single report.

use crate::context::GenerationContext;
use crate::error::{GenerateError, RenderError, SchemaError};
use crate::manifest::{load, ResolverStage};
use crate::render::sdl::{render_sdl, SCHEMA_FILE_NAME};
use crate::render::sink::{ArtifactSink, FsSink};
use crate::schema::{resolve, ResolvedSchema, ResolverLocation};
use crate::settings::GeneratorConfig;
use crate::template::failed_stage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One unit of render work.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Unit {
    Schema,
    Resolver(ResolverLocation),
    DataSource(String),
}

/// Outcome of rendering and writing a single artifact.
#[derive(Debug)]
pub struct ArtifactResult {
    pub name: String,
    pub outcome: Result<PathBuf, RenderError>,
    /// Final lifecycle stage, for resolver artifacts only.
    pub stage: Option<ResolverStage>,
}

#[derive(Debug)]
pub struct ArtifactError {
    pub name: String,
    pub error: RenderError,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Written artifacts, sorted.
    pub written: Vec<PathBuf>,
    pub errors: Vec<ArtifactError>,
    /// Diagnostics carried over from schema construction.
    pub schema_errors: Vec<SchemaError>,
    /// Where every resolver ended up, sorted by resolver name. Resolvers
    /// that never bound keep their discovery stage.
    pub resolver_stages: Vec<(String, ResolverStage)>,
}

impl GenerationReport {
    fn record(&mut self, result: ArtifactResult) {
        if let Some(stage) = result.stage {
            self.resolver_stages.push((result.name.clone(), stage));
        }
        match result.outcome {
            Ok(path) => self.written.push(path),
            Err(error) => self.errors.push(ArtifactError {
                name: result.name,
                error,
            }),
        }
    }

    pub fn stage_of(&self, resolver: &str) -> Option<ResolverStage> {
        self.resolver_stages
            .iter()
            .find(|(name, _)| name == resolver)
            .map(|(_, stage)| *stage)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len() + self.schema_errors.len()
    }

    /// True only when both the schema and every artifact came out clean.
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}

fn units(schema: &ResolvedSchema) -> Vec<Unit> {
    let mut units = vec![Unit::Schema];
    units.extend(
        schema
            .resolvers()
            .filter(|(_, r)| r.binding.is_some())
            .map(|(location, _)| Unit::Resolver(location)),
    );
    units.extend(schema.data_sources.keys().cloned().map(Unit::DataSource));
    units
}

/// Render every artifact of `schema` into `sink`. A failing artifact is
/// recorded and does not stop the others.
pub async fn generate(
    ctx: Arc<GenerationContext>,
    schema: Arc<ResolvedSchema>,
    sink: Arc<dyn ArtifactSink>,
) -> GenerationReport {
    let units = units(&schema);
    let dispatched = units.len();
    let permits = Arc::new(Semaphore::new(ctx.config.render_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut report = GenerationReport {
        schema_errors: schema.errors.clone(),
        resolver_stages: schema
            .resolvers()
            .filter(|(_, r)| r.binding.is_none())
            .map(|(_, r)| (r.to_string(), r.stage))
            .collect(),
        ..Default::default()
    };

    for unit in units {
        let ctx = Arc::clone(&ctx);
        let schema = Arc::clone(&schema);
        let sink = Arc::clone(&sink);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return ArtifactResult {
                        name: format!("{:?}", unit),
                        outcome: Err(RenderError::Task(e.to_string())),
                        stage: None,
                    }
                }
            };
            render_unit(&ctx, &schema, sink.as_ref(), unit).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| ArtifactResult {
            name: "render task".to_string(),
            outcome: Err(RenderError::Task(e.to_string())),
            stage: None,
        });
        report.record(result);
    }
    report.written.sort();
    report.resolver_stages.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::info!(
        dispatched,
        written = report.written.len(),
        failed = report.errors.len(),
        "generation finished"
    );
    report
}

async fn render_unit(
    ctx: &GenerationContext,
    schema: &ResolvedSchema,
    sink: &dyn ArtifactSink,
    unit: Unit,
) -> ArtifactResult {
    let (name, outcome, stage) = match unit {
        Unit::Schema => {
            let text = render_sdl(schema);
            (SCHEMA_FILE_NAME.to_string(), sink.write(SCHEMA_FILE_NAME, &text).await, None)
        }
        Unit::Resolver(location) => {
            let (name, outcome, stage) = render_resolver(ctx, schema, sink, &location).await;
            (name, outcome, Some(stage))
        }
        Unit::DataSource(name) => {
            let outcome = match schema.data_sources.get(&name) {
                Some(source) => {
                    match ctx
                        .binder
                        .render_data_source(&schema.api_name, &name, source, ctx.generated_at)
                        .await
                    {
                        Ok(rendered) => sink.write(&rendered.output_name, &rendered.text).await,
                        Err(e) => Err(e),
                    }
                }
                None => Err(RenderError::Unbound(name.clone())),
            };
            (name, outcome, None)
        }
    };

    match &outcome {
        Ok(path) => tracing::info!(artifact = %name, path = %path.display(), "artifact written"),
        Err(error) => tracing::warn!(artifact = %name, %error, "artifact failed"),
    }
    ArtifactResult { name, outcome, stage }
}

async fn render_resolver(
    ctx: &GenerationContext,
    schema: &ResolvedSchema,
    sink: &dyn ArtifactSink,
    location: &ResolverLocation,
) -> (String, Result<PathBuf, RenderError>, ResolverStage) {
    let Some(resolver) = schema.resolver_at(location) else {
        let name = format!("{:?}", location);
        return (name.clone(), Err(RenderError::Unbound(name)), ResolverStage::Unbound);
    };
    let name = resolver.to_string();
    let rendered = ctx
        .binder
        .bind(&schema.api_name, resolver, &schema.data_sources, ctx.generated_at)
        .await;
    let (outcome, stage) = match rendered {
        Ok(out) => {
            tracing::debug!(resolver = %name, signature = %out.signature, stage = ?out.stage, "resolver rendered");
            (sink.write(&out.output_name, &out.text).await, out.stage)
        }
        Err(error) => {
            let stage = failed_stage(&error);
            tracing::debug!(resolver = %name, stage = ?stage, "resolver not rendered");
            (Err(error), stage)
        }
    };
    (name, outcome, stage)
}

/// Load, resolve and render with the given settings, writing to
/// `config.output_path`. Manifest failures abort; everything later is
/// reported.
pub async fn run(config: GeneratorConfig) -> Result<GenerationReport, GenerateError> {
    let manifest = load(&config.manifest).await?;
    let schema = Arc::new(resolve(manifest));
    let sink: Arc<dyn ArtifactSink> = Arc::new(FsSink::new(config.output_path.clone()));
    let ctx = Arc::new(GenerationContext::new(config));
    Ok(generate(ctx, schema, sink).await)
}
