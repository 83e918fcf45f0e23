//! Generator binary. Every flag can also be set through its `APPSYNC_*`
//! variable; a `.env` file is honoured.
//!
//! Run from repo root: `cargo run -p appsyncgen -- -m path/to/manifest.yml`

use appsync_gen::settings::{
    default_custom_root, DEFAULT_OUTPUT_EXTENSION, DEFAULT_OUTPUT_PATH, DEFAULT_RENDER_CONCURRENCY,
    DEFAULT_TEMPLATE_ROOT,
};
use appsync_gen::{run, GenerateError, GeneratorConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "appsyncgen", version, about = "Generate a GraphQL schema and AppSync resolvers from a manifest")]
struct Cli {
    /// API manifest (YAML)
    #[arg(short, long, value_name = "FILE", env = "APPSYNC_MANIFEST")]
    manifest: PathBuf,

    /// Directory the generated files are written to
    #[arg(short = 'o', long = "outpath", value_name = "DIR", env = "APPSYNC_OUTPUT_PATH", default_value = DEFAULT_OUTPUT_PATH)]
    output_path: PathBuf,

    /// Standard template directory
    #[arg(short = 't', long = "templates", value_name = "DIR", env = "APPSYNC_TEMPLATE_ROOT", default_value = DEFAULT_TEMPLATE_ROOT)]
    template_root: PathBuf,

    /// User templates, searched first. Defaults to `mapping-templates` next to the manifest
    #[arg(short = 'c', long = "custom-templates", value_name = "DIR", env = "APPSYNC_CUSTOM_TEMPLATE_ROOT")]
    custom_template_root: Option<PathBuf>,

    /// Extension of resolver and data-source files
    #[arg(short = 'e', long = "extension", value_name = "EXT", env = "APPSYNC_OUTPUT_EXTENSION", default_value = DEFAULT_OUTPUT_EXTENSION)]
    output_extension: String,

    /// Maximum number of artifacts rendered at once
    #[arg(
        short = 'j',
        long = "concurrency",
        value_name = "N",
        env = "APPSYNC_RENDER_CONCURRENCY",
        default_value_t = DEFAULT_RENDER_CONCURRENCY as u32,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    render_concurrency: u32,
}

impl Cli {
    fn into_config(self) -> GeneratorConfig {
        let custom_template_root = self
            .custom_template_root
            .or_else(|| default_custom_root(&self.manifest));
        GeneratorConfig {
            manifest: self.manifest,
            output_path: self.output_path,
            template_root: self.template_root,
            custom_template_root,
            output_extension: self.output_extension.trim_start_matches('.').to_string(),
            render_concurrency: self.render_concurrency as usize,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("appsync_gen=info")),
        )
        .init();

    let config = Cli::parse().into_config();
    match generate(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}

async fn generate(config: GeneratorConfig) -> Result<(), GenerateError> {
    tracing::info!(
        manifest = %config.manifest.display(),
        output = %config.output_path.display(),
        "generating"
    );

    let report = run(config).await?;
    for error in &report.schema_errors {
        tracing::error!(%error, "schema error");
    }
    for failure in &report.errors {
        tracing::error!(artifact = %failure.name, error = %failure.error, "render error");
    }
    if !report.is_success() {
        return Err(GenerateError::Generation(report.error_count()));
    }
    tracing::info!(written = report.written.len(), "generation complete");
    Ok(())
}
