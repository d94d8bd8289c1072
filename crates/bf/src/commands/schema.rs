//! `befund schema` command implementation.

use std::path::{Path, PathBuf};

use bf_cache::{FileSchemaCache, NullSchemaCache, SchemaCache, TemplateDigest};
use bf_config::{CliSettings, Config};
use clap::Args;

use crate::error::CliError;
use crate::output::{Output, write_stdout};

/// Cache format version; bump when the descriptor JSON changes.
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Arguments for the schema command.
#[derive(Args)]
pub(crate) struct SchemaArgs {
    /// Template file.
    template: PathBuf,

    /// Disable the schema cache.
    #[arg(long)]
    no_cache: bool,
}

impl SchemaArgs {
    /// Execute the schema command.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let settings = CliSettings {
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&settings))?;

        let cache: Box<dyn SchemaCache> = if config.cache_resolved.enabled {
            Box::new(FileSchemaCache::new(
                config.cache_resolved.dir.clone(),
                CACHE_VERSION,
            ))
        } else {
            Box::new(NullSchemaCache)
        };

        let source = super::read_source(&self.template)?;
        let template_id = template_id(&self.template);
        let digest = TemplateDigest::of(&source);

        let inputs = if let Some(inputs) = cache.get(&template_id, &digest) {
            inputs
        } else {
            let template = super::parse_template(&self.template, &source, &super::parse_options(&config))?;
            for warning in &template.schema().warnings {
                output.warning(&format!("Warning: {warning}"));
            }
            cache.set(&template_id, &digest, template.inputs());
            template.inputs().to_vec()
        };

        write_stdout(&serde_json::to_string_pretty(&inputs)?)?;
        Ok(())
    }
}

/// Stable cache id of a template file.
fn template_id(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
