//! Shared generation state handed to every render task.

use crate::settings::GeneratorConfig;
use crate::template::{TemplateBinder, TemplateRoots};
use chrono::{DateTime, Utc};

/// Configuration plus the template cache for one run.
#[derive(Debug)]
pub struct GenerationContext {
    pub config: GeneratorConfig,
    pub binder: TemplateBinder,
    /// Stamped into every rendered artifact of the run.
    pub generated_at: DateTime<Utc>,
}

impl GenerationContext {
    pub fn new(config: GeneratorConfig) -> Self {
        let roots = TemplateRoots::new(config.template_root.clone(), config.custom_template_root.clone());
        let binder = TemplateBinder::new(roots, config.output_extension.clone());
        GenerationContext {
            config,
            binder,
            generated_at: Utc::now(),
        }
    }
}
