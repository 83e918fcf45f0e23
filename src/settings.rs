//! Generator settings. Read from `APPSYNC_*` environment variables, each with
//! a default except the manifest path.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_PATH: &str = "generated";
pub const DEFAULT_TEMPLATE_ROOT: &str = "templates";
pub const DEFAULT_OUTPUT_EXTENSION: &str = "tf";
pub const DEFAULT_RENDER_CONCURRENCY: usize = 8;
/// Directory next to the manifest holding user mapping templates.
pub const CUSTOM_TEMPLATE_DIR: &str = "mapping-templates";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub manifest: PathBuf,
    pub output_path: PathBuf,
    pub template_root: PathBuf,
    /// Searched before `template_root`.
    pub custom_template_root: Option<PathBuf>,
    pub output_extension: String,
    /// Upper bound on concurrently rendering artifacts.
    pub render_concurrency: usize,
}

impl GeneratorConfig {
    /// Defaults for everything but the manifest path.
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        let manifest = manifest.into();
        let custom_template_root = default_custom_root(&manifest);
        GeneratorConfig {
            manifest,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            template_root: PathBuf::from(DEFAULT_TEMPLATE_ROOT),
            custom_template_root,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            render_concurrency: DEFAULT_RENDER_CONCURRENCY,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let manifest = var("APPSYNC_MANIFEST").ok_or(ConfigError::Missing("APPSYNC_MANIFEST"))?;
        let mut config = GeneratorConfig::new(manifest);

        if let Some(path) = var("APPSYNC_OUTPUT_PATH") {
            config.output_path = PathBuf::from(path);
        }
        if let Some(root) = var("APPSYNC_TEMPLATE_ROOT") {
            config.template_root = PathBuf::from(root);
        }
        if let Some(root) = var("APPSYNC_CUSTOM_TEMPLATE_ROOT") {
            config.custom_template_root = Some(PathBuf::from(root));
        }
        if let Some(ext) = var("APPSYNC_OUTPUT_EXTENSION") {
            config.output_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(value) = var("APPSYNC_RENDER_CONCURRENCY") {
            config.render_concurrency = match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "APPSYNC_RENDER_CONCURRENCY",
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

/// `<manifest dir>/mapping-templates`, if that directory exists.
pub fn default_custom_root(manifest: &Path) -> Option<PathBuf> {
    let dir = manifest.parent().unwrap_or_else(|| Path::new("")).join(CUSTOM_TEMPLATE_DIR);
    dir.is_dir().then_some(dir)
}
